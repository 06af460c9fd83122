use anyhow::{Context, Result};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::wifi::{
    AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi,
};
use log::{info, warn};

/// Associated station interface. Dropping it tears the radio down.
pub struct WifiSession {
    wifi: Box<EspWifi<'static>>,
    pub ip_address: String,
}

/// Log association state from ESP-IDF internals.
fn log_wifi_diag(label: &str) {
    unsafe {
        let mut ap_info: esp_idf_sys::wifi_ap_record_t = core::mem::zeroed();
        let ap_rc = esp_idf_sys::esp_wifi_sta_get_ap_info(&mut ap_info);
        if ap_rc == esp_idf_sys::ESP_OK {
            info!(
                "WiFi [{}]: assoc=YES rssi={} ch={}",
                label, ap_info.rssi, ap_info.primary
            );
        } else {
            info!("WiFi [{}]: assoc=NO (ap_info err={})", label, ap_rc);
        }
    }
}

/// Join the configured network once. There is no retry: a failed join ends
/// the cycle and the next timer wake tries again.
pub fn connect_wifi(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    ssid: &str,
    password: &str,
) -> Result<WifiSession> {
    let mut esp_wifi = EspWifi::new(modem, sysloop.clone(), None)?;

    let auth = if password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };

    let mut wifi_ssid = heapless::String::<32>::new();
    let mut wifi_pass = heapless::String::<64>::new();
    if wifi_ssid.push_str(ssid).is_err() {
        warn!("WiFi SSID longer than 32 bytes, truncated");
    }
    if wifi_pass.push_str(password).is_err() {
        warn!("WiFi passphrase longer than 64 bytes, truncated");
    }

    esp_wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: wifi_ssid,
        password: wifi_pass,
        auth_method: auth,
        ..Default::default()
    }))?;

    let mut blocking_wifi = BlockingWifi::wrap(&mut esp_wifi, sysloop)?;

    blocking_wifi.start()?;
    info!("Connecting to {}", ssid);

    let t0 = unsafe { esp_idf_sys::esp_timer_get_time() };
    let joined = blocking_wifi.connect();
    let elapsed_ms = (unsafe { esp_idf_sys::esp_timer_get_time() } - t0) / 1000;
    log_wifi_diag(if joined.is_ok() { "join OK" } else { "join FAIL" });
    joined.with_context(|| format!("WiFi join to '{}' failed after {}ms", ssid, elapsed_ms))?;
    info!("Connected to {}!", ssid);

    blocking_wifi.wait_netif_up()?;
    let ip_info = blocking_wifi.wifi().sta_netif().get_ip_info()?;
    info!("My IP address is {}", ip_info.ip);

    // The underlying EspWifi stays associated once the wrapper is gone.
    drop(blocking_wifi);

    Ok(WifiSession {
        wifi: Box::new(esp_wifi),
        ip_address: ip_info.ip.to_string(),
    })
}

impl WifiSession {
    /// Disassociate and stop the radio ahead of deep sleep.
    pub fn shutdown(mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi disconnect failed: {}", e);
        }
        if let Err(e) = self.wifi.stop() {
            warn!("WiFi stop failed: {}", e);
        }
        info!("WiFi down ({} released)", self.ip_address);
    }
}
