//! Built-in board revisions.
//!
//! Each revision is the Colorlight baseline with a handful of fields changed.

use ecpsoc_core::units::{MHZ, MIB};
use ecpsoc_core::{
    DramModule, DramTiming, EthernetConfig, ResetSource, SpiFlashConfig, SpiMode,
    TargetConfiguration,
};

/// Names of the built-in presets, oldest revision first.
pub const PRESETS: &[&str] = &["rev1", "rev2", "rev3"];

/// Look up a built-in preset by name.
pub fn preset(name: &str) -> Option<TargetConfiguration> {
    match name {
        "rev1" => Some(rev1()),
        "rev2" => Some(rev2()),
        "rev3" => Some(rev3()),
        _ => None,
    }
}

/// All built-in presets in revision order.
pub fn builtin_targets() -> Vec<TargetConfiguration> {
    vec![rev1(), rev2(), rev3()]
}

fn button_reset() -> ResetSource {
    ResetSource {
        pad: "user_btn_n".into(),
        active_low: true,
    }
}

/// 50 MHz, single-rate SDRAM and Ethernet. Boots from integrated ROM only.
pub fn rev1() -> TargetConfiguration {
    let mut config = TargetConfiguration::colorlight_baseline("rev1");
    config.ident = "ecpsoc Colorlight 5A-75B rev1".into();
    config.ethernet = Some(EthernetConfig::default());
    config
}

/// 66 MHz with single-lane SPI flash boot and a reset button, no Ethernet.
pub fn rev2() -> TargetConfiguration {
    let mut config = TargetConfiguration::colorlight_baseline("rev2");
    config.ident = "ecpsoc Colorlight 5A-75B rev2".into();
    config.sys_clk_hz = 66 * MHZ;
    config.spi_flash = Some(SpiFlashConfig {
        mode: SpiMode::X1,
        dummy_cycles: 8,
        size_bytes: 4 * MIB,
        boot_reserved_bytes: MIB,
    });
    config.reset = Some(button_reset());
    config
}

/// 90 MHz with a half-rate SDRAM controller, quad SPI flash, Ethernet and USB clocks.
pub fn rev3() -> TargetConfiguration {
    let mut config = TargetConfiguration::colorlight_baseline("rev3");
    config.ident = "ecpsoc Colorlight 5A-75B rev3".into();
    config.sys_clk_hz = 90 * MHZ;
    config.usb_pll = true;
    config.dram.timing = DramTiming::HalfRate;
    config.dram.module = DramModule::m12l64322a();
    config.dram.size_cap = Some(2 * MIB);
    config.ethernet = Some(EthernetConfig::default());
    config.spi_flash = Some(SpiFlashConfig {
        mode: SpiMode::X4,
        dummy_cycles: 6,
        size_bytes: 4 * MIB,
        boot_reserved_bytes: MIB,
    });
    config.reset = Some(button_reset());
    config
}
