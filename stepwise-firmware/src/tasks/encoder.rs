//! Quadrature encoder task
//!
//! Waits for an edge on either channel and applies the decoded step to the
//! channel's shared counter. One instance per motor.

use defmt::*;
use embassy_futures::select::select;
use embassy_rp::gpio::Input;
use portable_atomic::{AtomicI32, Ordering};

use stepwise_drivers::encoder::QuadratureDecoder;

/// Encoder edge counting task
#[embassy_executor::task(pool_size = 2)]
pub async fn encoder_task(
    index: usize,
    mut a: Input<'static>,
    mut b: Input<'static>,
    count: &'static AtomicI32,
) {
    info!("Encoder {} task started", index);

    let mut decoder = QuadratureDecoder::new(a.is_high(), b.is_high());
    let mut reported_invalid = 0;

    loop {
        select(a.wait_for_any_edge(), b.wait_for_any_edge()).await;

        let delta = decoder.update(a.is_high(), b.is_high());
        if delta != 0 {
            count.fetch_add(i32::from(delta), Ordering::Relaxed);
        }

        let invalid = decoder.invalid_transitions();
        if invalid != reported_invalid {
            warn!("Encoder {}: missed edge ({} total)", index, invalid);
            reported_invalid = invalid;
        }
    }
}
