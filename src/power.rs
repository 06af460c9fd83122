use esp_idf_hal::delay::FreeRtos;
use log::info;

use bin_day_epd::lifecycle::WakeAlarm;

/// Microseconds since boot.
pub fn now_us() -> u64 {
    let t = unsafe { esp_idf_sys::esp_timer_get_time() };
    u64::try_from(t).unwrap_or(0)
}

/// Arm the timer wake and enter deep sleep. The next wake is a fresh boot.
pub fn deep_sleep(alarm: WakeAlarm) -> ! {
    let remaining = alarm.remaining_at(now_us());
    let sleep_us = u64::try_from(remaining.as_micros()).unwrap_or(u64::MAX);
    info!("Deep sleep for {}s", remaining.as_secs());
    unsafe {
        esp_idf_sys::esp_sleep_enable_timer_wakeup(sleep_us);
        esp_idf_sys::esp_deep_sleep_start();
    }
    #[allow(unreachable_code)]
    loop {
        FreeRtos::delay_ms(1000);
    }
}
