fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=secrets.local.rs");
    emit_local_secrets();
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}

fn emit_local_secrets() {
    let path = std::path::Path::new("secrets.local.rs");
    let Ok(src) = std::fs::read_to_string(path) else {
        println!("cargo:warning=secrets.local.rs not found; firmware will refuse to start");
        return;
    };

    for (name, env) in [
        ("WIFI_SSID", "LOCAL_WIFI_SSID"),
        ("WIFI_PASS", "LOCAL_WIFI_PASS"),
        ("ADDRESS_ID", "LOCAL_ADDRESS_ID"),
    ] {
        if let Some(v) = extract_rust_str_const(&src, name) {
            println!("cargo:rustc-env={}={}", env, v);
        }
    }
}

/// Value of `pub const NAME: &str = "...";`, ignoring commented-out lines.
fn extract_rust_str_const(src: &str, name: &str) -> Option<String> {
    let prefix = format!("pub const {}", name);
    src.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("//"))
        .filter(|line| {
            line.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.trim_start().starts_with(':'))
        })
        .find_map(|line| {
            let (_, value) = line.split_once('=')?;
            let value = value.trim().trim_end_matches(';').trim_end();
            let value = value.strip_prefix('"')?.strip_suffix('"')?;
            Some(value.to_string())
        })
}
