//! The target composer.
//!
//! [`assemble`] runs clock derivation, address map allocation and peripheral
//! attachment strictly in that order. Any failure aborts the whole pass; there
//! is no partially assembled target.

use serde::{Deserialize, Serialize};
use tracing::info;

use ecpsoc_clock::ClockTree;
use ecpsoc_core::hash::{content_hash, hash_hex};
use ecpsoc_core::layout::{CSR, MAIN_RAM, ROM, SPIFLASH, SRAM};
use ecpsoc_core::units::{format_bytes, format_hz};
use ecpsoc_core::{BuildConstant, Pad, Result, SocError, TargetConfiguration};
use ecpsoc_memmap::{main_ram_size, AddressMap, CsrSlot, MainRamSizing, CSR_PAGING};
use ecpsoc_periph::{PeripheralAttacher, PeripheralBinding};

use crate::error::TargetError;
use crate::parse::check_target;

/// CSR pages of the SoC core, reserved ahead of any peripheral.
pub const CORE_CSR_PAGES: &[&str] = &["ctrl", "identifier_mem", "uart", "timer0"];

/// A fully composed target, ready for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssembledTarget {
    pub config: TargetConfiguration,
    pub clocks: ClockTree,
    pub map: AddressMap,
    pub main_ram: MainRamSizing,
    pub csr: Vec<CsrSlot>,
    pub bindings: Vec<PeripheralBinding>,
    pub pads: Vec<Pad>,
    pub constants: Vec<BuildConstant>,
}

impl AssembledTarget {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn constant(&self, name: &str) -> Option<&BuildConstant> {
        self.constants.iter().find(|c| c.name == name)
    }

    pub fn binding(&self, peripheral: &str) -> Option<&PeripheralBinding> {
        self.bindings.iter().find(|b| b.peripheral == peripheral)
    }

    /// SHA-256 over the canonical JSON form, as hex.
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        content_hash(self).map(|h| hash_hex(&h))
    }
}

/// Compose `config` into an assembled target.
pub fn assemble(config: &TargetConfiguration) -> Result<AssembledTarget> {
    if let Err(TargetError::Validation { detail }) = check_target(config) {
        return Err(SocError::configuration(detail));
    }

    // Clock domains
    let mut attacher = PeripheralAttacher::new(&config.board);
    let clocks = ecpsoc_clock::derive(config, attacher.pads_mut())?;
    attacher.provide_clocks(clocks)?;

    // Address map
    let mut map = AddressMap::from_layout(&config.memory_map, &config.cpu)?;
    map.bind(ROM, config.integrated_rom_bytes)?;
    map.bind(SRAM, config.integrated_sram_bytes)?;
    let sizing = main_ram_size(&config.dram, &config.board, &config.cpu)?;
    map.bind(MAIN_RAM, sizing.mapped)?;
    if let Some(flash) = &config.spi_flash {
        map.bind(SPIFLASH, flash.size_bytes)?;
    }
    map.check_disjoint()?;
    info!(
        target = %config.name,
        main_ram = %format_bytes(sizing.mapped),
        regions = map.regions().len(),
        "address map allocated"
    );
    attacher.provide_map(map)?;

    // Peripherals
    for page in CORE_CSR_PAGES {
        attacher.reserve_csr(page)?;
    }
    attacher.pads_mut().request("uart", "serial", 0)?;
    attacher.attach_dram(&config.dram, &sizing)?;
    if let Some(eth) = &config.ethernet {
        attacher.attach_ethernet(eth)?;
    }
    if let Some(flash) = &config.spi_flash {
        attacher.attach_spi_flash(flash)?;
    }
    let done = attacher.finish()?;
    done.map.check_disjoint()?;

    let mut constants = core_constants(config, &done.clocks, &done.map)?;
    constants.extend(done.constants);
    for (i, c) in constants.iter().enumerate() {
        if constants[..i].iter().any(|o| o.name == c.name) {
            return Err(SocError::configuration(format!(
                "build constant {} published twice",
                c.name
            )));
        }
    }

    info!(
        target = %config.name,
        sys = %format_hz(sys_hz(&done.clocks)?),
        peripherals = done.bindings.len(),
        constants = constants.len(),
        "target assembled"
    );
    Ok(AssembledTarget {
        config: config.clone(),
        clocks: done.clocks,
        map: done.map,
        main_ram: sizing,
        csr: done.csr.map(|w| w.slots().to_vec()).unwrap_or_default(),
        bindings: done.bindings,
        pads: done.pads,
        constants,
    })
}

/// Frequency the PLL actually delivers to the system domain.
fn sys_hz(clocks: &ClockTree) -> Result<u64> {
    clocks
        .primary()
        .map(|d| d.achieved_hz)
        .ok_or_else(|| SocError::sequencing("publish core constants", "a primary clock domain"))
}

fn core_constants(
    config: &TargetConfiguration,
    clocks: &ClockTree,
    map: &AddressMap,
) -> Result<Vec<BuildConstant>> {
    let base = |name: &str| {
        map.region(name)
            .map(|r| r.base)
            .ok_or_else(|| SocError::sequencing("publish core constants", format!("region '{name}'")))
    };
    let rom = base(ROM)?;
    Ok(vec![
        BuildConstant::int("CONFIG_CLOCK_FREQUENCY", sys_hz(clocks)?),
        BuildConstant::string("CONFIG_CPU_TYPE", config.cpu.kind.to_uppercase()),
        BuildConstant::string("CONFIG_CPU_VARIANT", config.cpu.variant.to_uppercase()),
        BuildConstant::int("CONFIG_CPU_RESET_ADDR", rom),
        BuildConstant::int("CONFIG_BUS_DATA_WIDTH", u64::from(config.cpu.bus_data_width)),
        BuildConstant::int("CONFIG_CSR_PAGING", CSR_PAGING),
        BuildConstant::string("IDENT", &config.ident),
        BuildConstant::int("ROM_BASE", rom),
        BuildConstant::int("ROM_SIZE", config.integrated_rom_bytes),
        BuildConstant::int("SRAM_BASE", base(SRAM)?),
        BuildConstant::int("SRAM_SIZE", config.integrated_sram_bytes),
        BuildConstant::int("CSR_BASE", base(CSR)?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{rev1, rev2, rev3};
    use ecpsoc_clock::crg::{SYS, SYS2X, SYS2X_PS, SYS_PS, USB_12, USB_48};
    use ecpsoc_core::layout::ETHMAC;
    use ecpsoc_core::units::{MHZ, MIB};
    use ecpsoc_core::{DramTiming, ErrorKind};

    fn int(target: &AssembledTarget, name: &str) -> u64 {
        target.constant(name).and_then(|c| c.as_int()).unwrap()
    }

    #[test]
    fn rev1_maps_full_module_without_flash() {
        let target = assemble(&rev1()).unwrap();
        let main_ram = target.map.region(MAIN_RAM).unwrap();
        assert_eq!(main_ram.base, 0x4000_0000);
        assert_eq!(main_ram.size, 4 * MIB);
        assert!(!target.map.region(SPIFLASH).unwrap().populated);
        assert!(target.constant("FLASH_BOOT_ADDRESS").is_none());
        assert!(target.binding("ethmac").is_some());
        assert_eq!(int(&target, "CONFIG_CLOCK_FREQUENCY"), 50 * MHZ);

        let sys = target.clocks.domain(SYS).unwrap();
        let sys_ps = target.clocks.domain(SYS_PS).unwrap();
        assert_eq!(sys.achieved_hz, 50 * MHZ);
        assert_eq!(sys_ps.achieved_hz, sys.achieved_hz);
        assert_eq!(sys_ps.phase_deg, 180);
        assert!(target.clocks.domain(SYS2X).is_none());
    }

    #[test]
    fn rev2_boots_after_reserved_prefix() {
        let target = assemble(&rev2()).unwrap();
        assert_eq!(int(&target, "FLASH_BOOT_ADDRESS"), 0x2000_0000 + MIB);
        assert_eq!(int(&target, "SPIFLASH_DUMMY_CYCLES"), 8);
        assert!(target.binding("ethmac").is_none());
        assert!(!target.map.region(ETHMAC).unwrap().populated);
        assert!(!target.pads.iter().any(|p| p.name == "eth"));

        let reset = target.clocks.primary_reset().unwrap();
        assert!(reset.external.is_some());
        assert!(reset.asserted(true, false, false));
        assert!(!reset.asserted(true, true, false));
    }

    #[test]
    fn clock_constant_is_what_the_pll_delivers() {
        let target = assemble(&rev2()).unwrap();
        assert_eq!(target.config.sys_clk_hz, 66 * MHZ);
        assert_eq!(target.clocks.primary().unwrap().achieved_hz, 65_625_000);
        assert_eq!(int(&target, "CONFIG_CLOCK_FREQUENCY"), 65_625_000);
    }

    #[test]
    fn rev3_half_rate_and_cap() {
        let target = assemble(&rev3()).unwrap();
        assert_eq!(target.map.region(MAIN_RAM).unwrap().size, 2 * MIB);
        assert_eq!(target.main_ram.capacity, 8 * MIB);
        assert_eq!(target.main_ram.port_data_width, 64);
        assert_eq!(target.clocks.dram_timing, DramTiming::HalfRate);

        let sys = target.clocks.domain(SYS).unwrap();
        let fast = target.clocks.domain(SYS2X).unwrap();
        let out = target.clocks.domain(SYS2X_PS).unwrap();
        assert_eq!(fast.achieved_hz, 2 * sys.achieved_hz);
        assert_eq!(out.achieved_hz, fast.achieved_hz);
        assert_eq!(int(&target, "CONFIG_CLOCK_FREQUENCY"), sys.achieved_hz);
        assert_eq!(out.hz, 180 * MHZ);
        assert_eq!(out.phase_deg, 180);
        assert_eq!(target.clocks.dram_output, SYS2X_PS);

        for (name, hz) in [(USB_12, 12 * MHZ), (USB_48, 48 * MHZ)] {
            let achieved = target.clocks.domain(name).unwrap().achieved_hz;
            assert!(achieved.abs_diff(hz) * 100 <= hz, "{name} at {achieved}");
        }
        assert_eq!(int(&target, "FLASH_BOOT_ADDRESS"), 0x2010_0000);
        assert_eq!(
            target.constant("SPIFLASH_MODE").map(|c| c.value.to_string()),
            Some("\"4x\"".to_string())
        );
    }

    #[test]
    fn every_revision_keeps_regions_disjoint() {
        for config in [rev1(), rev2(), rev3()] {
            let target = assemble(&config).unwrap();
            let regions = target.map.regions();
            for (i, a) in regions.iter().enumerate() {
                for b in &regions[i + 1..] {
                    assert!(!a.overlaps(b), "{} overlaps {}", a.name, b.name);
                    assert!(a.base < b.base);
                }
            }
            for domain in &target.clocks.domains {
                assert_eq!(
                    target.clocks.reference_of(&domain.name),
                    Some("clk25"),
                    "{}",
                    domain.name
                );
            }
        }
    }

    #[test]
    fn csr_pages_are_ordered_and_window_bound() {
        let target = assemble(&rev3()).unwrap();
        let names: Vec<&str> = target.csr.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["ctrl", "identifier_mem", "uart", "timer0", "sdram", "ethphy", "ethmac", "spiflash"]
        );
        assert_eq!(target.csr[4].base, 0xf000_2000);
        assert_eq!(target.map.region(CSR).unwrap().size, 8 * CSR_PAGING);
    }

    #[test]
    fn assembly_is_idempotent() {
        let config = rev3();
        let a = assemble(&config).unwrap();
        let b = assemble(&config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_ne!(
            a.fingerprint().unwrap(),
            assemble(&rev1()).unwrap().fingerprint().unwrap()
        );
    }

    #[test]
    fn unrepresentable_clock_is_configuration_error() {
        let mut config = rev1();
        config.sys_clk_hz = 1_000;
        let err = assemble(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn validation_errors_abort_assembly() {
        let mut config = rev2();
        config.integrated_sram_bytes = 0;
        let err = assemble(&config).unwrap_err();
        assert!(err.to_string().contains("integrated SRAM size is zero"));
    }

    #[test]
    fn oversized_rom_overflows() {
        let mut config = rev1();
        config.integrated_rom_bytes = 0x2000_0000;
        let err = assemble(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
    }
}
