//! Stepwise - Motor Step-Response Experiment Firmware
//!
//! Main firmware binary for RP2040 boards with two H-bridge motor channels
//! and quadrature encoders. Each channel runs one closed-loop step-response
//! experiment; a cooperative scheduler resumes them by period and priority
//! and the recorded trajectories are reported over UART0.
//!
//! Board wiring:
//!
//! | Function          | Motor A        | Motor B        |
//! |-------------------|----------------|----------------|
//! | PWM forward (A)   | GPIO2 (PWM1A)  | GPIO8 (PWM4A)  |
//! | PWM reverse (B)   | GPIO3 (PWM1B)  | GPIO9 (PWM4B)  |
//! | Bridge enable     | GPIO4          | GPIO10         |
//! | Encoder A / B     | GPIO6 / GPIO7  | GPIO12 / GPIO13|
//!
//! UART0 TX/RX on GPIO0/GPIO1 (115200 baud), abort button on GPIO15
//! (active low).

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm, PwmOutput};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use stepwise_core::config::{validate_all, EndBehavior, ExperimentConfig};
use stepwise_core::experiment::ExperimentTask;
use stepwise_core::scheduler::Orchestrator;
use stepwise_drivers::controller::ProportionalController;
use stepwise_drivers::encoder::QuadratureEncoder;
use stepwise_drivers::motor::HBridgeMotor;

use crate::channels::{COMPLETION, ENCODER_COUNTS};
use crate::config::{experiments, MOTOR_COUNT, SAMPLE_LOG_CAPACITY};
use crate::io::{PipeSink, SignalParams};

mod channels;
mod config;
mod io;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// PWM wrap value: 125 MHz / (6249 + 1) = 20 kHz, above audible range
const PWM_TOP: u16 = 6_249;

type Motor = HBridgeMotor<Output<'static>, PwmOutput<'static>, PwmOutput<'static>>;

type Experiment = ExperimentTask<
    'static,
    Motor,
    QuadratureEncoder<'static>,
    ProportionalController,
    SAMPLE_LOG_CAPACITY,
>;

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

// Experiments and their I/O adapters are borrowed by the orchestrator for
// the whole program
static EXPERIMENTS: StaticCell<[Experiment; MOTOR_COUNT]> = StaticCell::new();
static SINKS: StaticCell<[PipeSink; MOTOR_COUNT]> = StaticCell::new();
static PARAM_SOURCES: StaticCell<[SignalParams; MOTOR_COUNT]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Stepwise firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let configs = experiments();
    if let Err(e) = validate_all(&configs) {
        // build.rs rejects these, so this only fires if the two disagree
        defmt::panic!("Invalid experiment table: {:?}", e);
    }
    for config in configs.iter() {
        info!("Experiment: {}", config);
    }

    // Serial link for reports and re-arm commands
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 64]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized for reporting");

    // H-bridge PWM outputs
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = PWM_TOP;

    let pwm_a = Pwm::new_output_ab(p.PWM_SLICE1, p.PIN_2, p.PIN_3, pwm_config.clone());
    let pwm_b = Pwm::new_output_ab(p.PWM_SLICE4, p.PIN_8, p.PIN_9, pwm_config);

    let (Some(fwd_a), Some(rev_a)) = pwm_a.split() else {
        defmt::panic!("PWM slice 1 outputs unavailable");
    };
    let (Some(fwd_b), Some(rev_b)) = pwm_b.split() else {
        defmt::panic!("PWM slice 4 outputs unavailable");
    };

    let motor_a = HBridgeMotor::new(Output::new(p.PIN_4, Level::Low), fwd_a, rev_a);
    let motor_b = HBridgeMotor::new(Output::new(p.PIN_10, Level::Low), fwd_b, rev_b);

    info!("Motor drivers initialized");

    // Encoders
    let enc_a = (Input::new(p.PIN_6, Pull::Up), Input::new(p.PIN_7, Pull::Up));
    let enc_b = (Input::new(p.PIN_12, Pull::Up), Input::new(p.PIN_13, Pull::Up));

    let abort_button = Input::new(p.PIN_15, Pull::Up);

    // Experiments
    let [sink_a, sink_b] = SINKS.init([PipeSink::new(0), PipeSink::new(1)]);
    let [params_a, params_b] = PARAM_SOURCES.init([SignalParams::new(0), SignalParams::new(1)]);

    let experiments = EXPERIMENTS.init([
        build_experiment(0, &configs[0], motor_a, sink_a, params_a),
        build_experiment(1, &configs[1], motor_b, sink_b, params_b),
    ]);

    let mut orchestrator: Orchestrator<'static, MOTOR_COUNT> = Orchestrator::new();
    for (index, (task, config)) in experiments.iter_mut().zip(configs.iter()).enumerate() {
        if let Err(e) =
            orchestrator.add(task, &COMPLETION[index], config.priority, config.period_ms)
        {
            defmt::panic!("Failed to register {}: {:?}", config.name.as_str(), e);
        }
    }

    info!("Experiments registered");

    // Spawn tasks
    spawner
        .spawn(tasks::encoder_task(0, enc_a.0, enc_a.1, &ENCODER_COUNTS[0]))
        .unwrap();
    spawner
        .spawn(tasks::encoder_task(1, enc_b.0, enc_b.1, &ENCODER_COUNTS[1]))
        .unwrap();
    spawner.spawn(tasks::report_tx_task(tx)).unwrap();
    spawner.spawn(tasks::command_rx_task(rx)).unwrap();
    spawner.spawn(tasks::abort_task(abort_button)).unwrap();
    spawner.spawn(tasks::runner_task(orchestrator)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Enable the bridge and wrap a motor channel in its experiment
fn build_experiment(
    index: usize,
    config: &ExperimentConfig,
    mut motor: Motor,
    sink: &'static mut PipeSink,
    params: &'static mut SignalParams,
) -> Experiment {
    if let Err(e) = motor.enable() {
        error!("{}: bridge enable failed: {:?}", config.name.as_str(), e);
    }

    let encoder = QuadratureEncoder::new(&ENCODER_COUNTS[index]);
    let controller = ProportionalController::from_params(config.control_params());

    let task = match ExperimentTask::new(
        motor,
        encoder,
        controller,
        config.task_settings(),
        &COMPLETION[index],
    ) {
        Ok(task) => task,
        Err(e) => defmt::panic!("{}: {:?}", config.name.as_str(), e),
    };

    let mut task = task.with_name(config.name.as_str());
    if config.recording {
        task = task.with_recording(sink);
    }
    if config.end == EndBehavior::Rearm {
        task = task.with_param_source(params);
    }
    task
}
