//! Report UART transmit task
//!
//! Drains the report pipe into the UART as fast as the line allows.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::REPORT_PIPE;

/// Report TX task - sends recorded samples to the host
#[embassy_executor::task]
pub async fn report_tx_task(mut tx: BufferedUartTx) {
    info!("Report TX task started");

    let mut buf = [0u8; 64];

    loop {
        let n = REPORT_PIPE.read(&mut buf).await;
        if let Err(e) = tx.write_all(&buf[..n]).await {
            warn!("UART write error: {:?}", e);
        }
    }
}
