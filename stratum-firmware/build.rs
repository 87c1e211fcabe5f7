//! Build script for stratum-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates display.toml and turns it into Rust constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    let config = load_config();
    let board = validate_config(&config);
    write_board_config(&board);
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
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and parse display.toml
fn load_config() -> toml::Value {
    println!("cargo:rerun-if-changed=display.toml");

    let config_path = Path::new("display.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: display.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a display.toml board configuration.       ║\n\
            ║  Please create one in the stratum-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read display.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in display.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    }
}

/// Validated board settings
struct Board {
    update_mode: &'static str,
    rotation: &'static str,
    inverted: bool,
    background: [u8; 3],
    debug_borders: bool,
    spi_frequency: u32,
    touch: bool,
    touch_spi_frequency: u32,
    calibrate_on_boot: bool,
}

fn validate_config(config: &toml::Value) -> Board {
    let mut errors = Vec::new();
    let display = config.get("display").and_then(|d| d.as_table());
    let touch = config.get("touch").and_then(|t| t.as_table());
    if display.is_none() {
        errors.push("missing [display] table".to_string());
    }

    let get = |table: Option<&toml::Table>, key: &str| table.and_then(|t| t.get(key)).cloned();

    let update_mode = match get(display, "update_mode") {
        None => "TopBottom",
        Some(toml::Value::String(s)) if s == "top_bottom" => "TopBottom",
        Some(toml::Value::String(s)) if s == "left_right" => "LeftRight",
        Some(_) => {
            errors.push("[display] update_mode must be 'top_bottom' or 'left_right'".to_string());
            "TopBottom"
        }
    };

    let rotation = match get(display, "rotation") {
        None => "Top",
        Some(toml::Value::String(s)) => match s.as_str() {
            "top" => "Top",
            "left" => "Left",
            "bottom" => "Bottom",
            "right" => "Right",
            _ => {
                errors.push("[display] rotation must be 'top', 'left', 'bottom' or 'right'".to_string());
                "Top"
            }
        },
        Some(_) => {
            errors.push("[display] rotation must be a string".to_string());
            "Top"
        }
    };

    let background = match get(display, "background") {
        None => [0, 0, 0],
        Some(toml::Value::Array(rgb)) => {
            let channels: Vec<u8> = rgb
                .iter()
                .filter_map(|c| c.as_integer())
                .filter_map(|c| u8::try_from(c).ok())
                .collect();
            if channels.len() == 3 && rgb.len() == 3 {
                [channels[0], channels[1], channels[2]]
            } else {
                errors.push("[display] background must be [r, g, b] with 0-255 channels".to_string());
                [0, 0, 0]
            }
        }
        Some(_) => {
            errors.push("[display] background must be an array".to_string());
            [0, 0, 0]
        }
    };

    let mut flag = |table: Option<&toml::Table>, section: &str, key: &str, default: bool| match get(table, key) {
        None => default,
        Some(toml::Value::Boolean(b)) => b,
        Some(_) => {
            errors.push(format!("[{}] {} must be true or false", section, key));
            default
        }
    };
    let inverted = flag(display, "display", "inverted", false);
    let debug_borders = flag(display, "display", "debug_borders", false);
    let touch_enabled = flag(touch, "touch", "enabled", true);
    let calibrate_on_boot = flag(touch, "touch", "calibrate_on_boot", false);

    let mut frequency = |table: Option<&toml::Table>, section: &str, default: u32, max: u32| match get(table, "spi_frequency") {
        None => default,
        Some(toml::Value::Integer(hz)) if hz > 0 && hz <= max as i64 => hz as u32,
        Some(_) => {
            errors.push(format!("[{}] spi_frequency must be 1-{} Hz", section, max));
            default
        }
    };
    let spi_frequency = frequency(display, "display", 40_000_000, 62_500_000);
    let touch_spi_frequency = frequency(touch, "touch", 2_000_000, 2_500_000);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid display configuration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    Board {
        update_mode,
        rotation,
        inverted,
        background,
        debug_borders,
        spi_frequency,
        touch: touch_enabled,
        touch_spi_frequency,
        calibrate_on_boot,
    }
}

/// Emit `board_config.rs` for `include!` from the firmware
fn write_board_config(board: &Board) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let [r, g, b] = board.background;
    let source = format!(
        "// Generated from display.toml by build.rs\n\
         pub const UPDATE_MODE: UpdateMode = UpdateMode::{};\n\
         pub const ROTATION: Rotation = Rotation::{};\n\
         pub const INVERTED: bool = {};\n\
         pub const BACKGROUND: (u8, u8, u8) = ({}, {}, {});\n\
         pub const DEBUG_BORDERS: bool = {};\n\
         pub const SPI_FREQUENCY: u32 = {};\n\
         pub const TOUCH: bool = {};\n\
         pub const TOUCH_SPI_FREQUENCY: u32 = {};\n\
         pub const CALIBRATE_ON_BOOT: bool = {};\n",
        board.update_mode,
        board.rotation,
        board.inverted,
        r,
        g,
        b,
        board.debug_borders,
        board.spi_frequency,
        board.touch,
        board.touch_spi_frequency,
        board.calibrate_on_boot,
    );
    fs::write(out_dir.join("board_config.rs"), source).unwrap();
}
