//! Build script for stepwise-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates experiments.toml at compile time
//! - Generates the experiment table the firmware runs

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Motor channels wired on the board
const MOTOR_COUNT: usize = 2;

/// Samples each experiment can record
const SAMPLE_LOG_CAPACITY: i64 = 500;

/// Label length accepted by the firmware
const MAX_LABEL_LEN: usize = 16;

/// Fractional bits of the firmware's fixed-point gain
const GAIN_FRAC_BITS: i32 = 32;

fn main() {
    setup_linker();
    let experiments = validate_config();
    generate_table(&experiments);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// One validated experiment, ready for code generation
struct Experiment {
    name: String,
    priority: u8,
    period_ms: u32,
    sample_limit: u32,
    setpoint: i32,
    gain_bits: i64,
    recording: bool,
    rearm: bool,
}

/// Validate experiments.toml configuration at compile time
fn validate_config() -> Vec<Experiment> {
    println!("cargo:rerun-if-changed=experiments.toml");

    let config_path = Path::new("experiments.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: experiments.toml not found!                              ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires an experiments.toml file describing one   ║\n\
            ║  experiment per motor channel in the stepwise-firmware directory.║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read experiments.toml                          ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in experiments.toml                  ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let entries = match config.get("experiment") {
        Some(toml::Value::Array(entries)) => entries,
        _ => fail(
            "Missing experiments",
            &["At least one [[experiment]] table is required".to_string()],
        ),
    };

    if entries.len() != MOTOR_COUNT {
        fail(
            "Wrong number of experiments",
            &[format!(
                "Board has {} motor channels, found {} [[experiment]] tables",
                MOTOR_COUNT,
                entries.len()
            )],
        );
    }

    let mut errors = Vec::new();
    let mut experiments = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        let Some(table) = entry.as_table() else {
            errors.push(format!("experiment {} must be a table", i));
            continue;
        };
        if let Some(experiment) = validate_experiment(i, table, &mut errors) {
            experiments.push(experiment);
        }
    }

    for (i, a) in experiments.iter().enumerate() {
        if experiments[i + 1..].iter().any(|b| b.name == a.name) {
            errors.push(format!("experiment name '{}' is used twice", a.name));
        }
    }

    if !errors.is_empty() {
        fail("Invalid experiment configuration", &errors);
    }

    println!("cargo:warning=experiments.toml validated successfully");
    experiments
}

/// Validate one [[experiment]] table
fn validate_experiment(
    index: usize,
    table: &toml::map::Map<String, toml::Value>,
    errors: &mut Vec<String>,
) -> Option<Experiment> {
    let before = errors.len();
    let ctx = format!("experiment {}", index);

    let name = match table.get("name") {
        Some(toml::Value::String(name)) => name.clone(),
        Some(_) => {
            errors.push(format!("[{}] name must be a string", ctx));
            String::new()
        }
        None => {
            errors.push(format!("[{}] missing 'name'", ctx));
            String::new()
        }
    };
    if table.contains_key("name") && name.is_empty() {
        errors.push(format!("[{}] name cannot be empty", ctx));
    }
    if name.len() > MAX_LABEL_LEN {
        errors.push(format!("[{}] name must be at most {} bytes", ctx, MAX_LABEL_LEN));
    }
    if name.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '-')) {
        errors.push(format!("[{}] name may only use a-z, 0-9, '_' and '-'", ctx));
    }

    let priority = integer(table, "priority", &ctx, 0, 255, Some(1), errors);
    let period_ms = integer(table, "period_ms", &ctx, 1, 60_000, Some(10), errors);
    let sample_limit = integer(table, "sample_limit", &ctx, 1, u32::MAX.into(), Some(500), errors);
    let setpoint = integer(table, "setpoint", &ctx, i32::MIN.into(), i32::MAX.into(), None, errors);

    let gain = match table.get("gain") {
        Some(toml::Value::Float(g)) => *g,
        Some(toml::Value::Integer(g)) => *g as f64,
        Some(_) => {
            errors.push(format!("[{}] gain must be a number", ctx));
            0.0
        }
        None => {
            errors.push(format!("[{}] missing 'gain'", ctx));
            0.0
        }
    };
    if !gain.is_finite() || !(0.0..=1000.0).contains(&gain) {
        errors.push(format!("[{}] gain must be 0.0-1000.0", ctx));
    }

    let recording = match table.get("recording") {
        Some(toml::Value::Boolean(b)) => *b,
        Some(_) => {
            errors.push(format!("[{}] recording must be true or false", ctx));
            false
        }
        None => true,
    };
    if recording && sample_limit > SAMPLE_LOG_CAPACITY {
        errors.push(format!(
            "[{}] sample_limit must be at most {} when recording",
            ctx, SAMPLE_LOG_CAPACITY
        ));
    }

    let rearm = match table.get("end") {
        Some(toml::Value::String(end)) => match end.as_str() {
            "terminal" => false,
            "rearm" => true,
            _ => {
                errors.push(format!("[{}] end must be 'terminal' or 'rearm'", ctx));
                false
            }
        },
        Some(_) => {
            errors.push(format!("[{}] end must be a string", ctx));
            false
        }
        None => false,
    };

    for key in table.keys() {
        if ![
            "name",
            "priority",
            "period_ms",
            "sample_limit",
            "setpoint",
            "gain",
            "recording",
            "end",
        ]
        .contains(&key.as_str())
        {
            errors.push(format!("[{}] unknown key '{}'", ctx, key));
        }
    }

    if errors.len() > before {
        return None;
    }

    Some(Experiment {
        name,
        priority: priority as u8,
        period_ms: period_ms as u32,
        sample_limit: sample_limit as u32,
        setpoint: setpoint as i32,
        gain_bits: (gain * f64::from(2u32).powi(GAIN_FRAC_BITS)).round() as i64,
        recording,
        rearm,
    })
}

/// Read an integer field, checking its range
fn integer(
    table: &toml::map::Map<String, toml::Value>,
    key: &str,
    ctx: &str,
    min: i64,
    max: i64,
    default: Option<i64>,
    errors: &mut Vec<String>,
) -> i64 {
    match (table.get(key), default) {
        (Some(toml::Value::Integer(v)), _) => {
            if *v < min || *v > max {
                errors.push(format!("[{}] {} must be {}-{}", ctx, key, min, max));
            }
            *v
        }
        (Some(_), _) => {
            errors.push(format!("[{}] {} must be an integer", ctx, key));
            0
        }
        (None, Some(default)) => default,
        (None, None) => {
            errors.push(format!("[{}] missing '{}'", ctx, key));
            0
        }
    }
}

/// Write the experiment table to OUT_DIR/experiments.rs
fn generate_table(experiments: &[Experiment]) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let mut code = String::new();
    code.push_str("// Generated by build.rs from experiments.toml\n\n");
    code.push_str(&format!("pub const MOTOR_COUNT: usize = {};\n", MOTOR_COUNT));
    code.push_str(&format!(
        "pub const SAMPLE_LOG_CAPACITY: usize = {};\n\n",
        SAMPLE_LOG_CAPACITY
    ));
    code.push_str("pub fn experiments() -> [ExperimentConfig; MOTOR_COUNT] {\n    [\n");
    for e in experiments {
        code.push_str(&format!(
            "        experiment({:?}, {}, {}, {}, {}, Gain::from_bits({}), {}, {}),\n",
            e.name,
            e.priority,
            e.period_ms,
            e.sample_limit,
            e.setpoint,
            e.gain_bits,
            e.recording,
            if e.rearm {
                "EndBehavior::Rearm"
            } else {
                "EndBehavior::Terminal"
            }
        ));
    }
    code.push_str("    ]\n}\n");

    fs::write(out_dir.join("experiments.rs"), code).unwrap();
}

/// Abort the build with a boxed list of errors
fn fail(title: &str, errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
