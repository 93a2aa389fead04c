//! Abort button task

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::Timer;

use crate::channels::ABORT;

/// Debounce time for the abort button
const DEBOUNCE_MS: u64 = 20;

/// Abort task - raises the abort signal when the button is pressed
#[embassy_executor::task]
pub async fn abort_task(mut button: Input<'static>) {
    info!("Abort task started");

    loop {
        button.wait_for_falling_edge().await;
        Timer::after_millis(DEBOUNCE_MS).await;

        if button.is_low() {
            warn!("Abort button pressed");
            ABORT.signal(());
        }
    }
}
