// Copy to secrets.local.rs (git-ignored) and fill in. build.rs reads the
// string constants below and bakes them into the firmware image.

pub const WIFI_SSID: &str = "your-network";
pub const WIFI_PASS: &str = "your-passphrase";
pub const ADDRESS_ID: &str = "your-address-id";
