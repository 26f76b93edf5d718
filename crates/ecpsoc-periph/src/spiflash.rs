//! SPI boot flash attachment.

use tracing::info;

use ecpsoc_core::layout::SPIFLASH;
use ecpsoc_core::{BuildConstant, Result, SocError, SpiFlashConfig};

use crate::attach::{AttachRequest, PeripheralAttacher};
use crate::binding::{PeripheralBinding, PeripheralKind, PeripheralMode};

impl PeripheralAttacher {
    /// Attach the memory-mapped SPI flash and publish the firmware boot address.
    ///
    /// The `spiflash` region must already be bound with the flash size.
    pub fn attach_spi_flash(&mut self, config: &SpiFlashConfig) -> Result<PeripheralBinding> {
        if config.dummy_cycles == 0 {
            return Err(SocError::configuration(format!(
                "SPI flash in {} mode needs at least one dummy cycle",
                config.mode.as_str()
            )));
        }
        self.clocks()?;
        let boot = self.map()?.boot_offset(config.boot_reserved_bytes)?;
        let binding = self.attach(AttachRequest {
            peripheral: "spiflash".into(),
            kind: PeripheralKind::SpiFlash,
            domain: "sys".into(),
            aux_domains: Vec::new(),
            region: SPIFLASH.into(),
            mode: PeripheralMode::SpiFlash {
                mode: config.mode,
                dummy_cycles: config.dummy_cycles,
            },
            pads: vec![(config.mode.pad_name().into(), 0)],
            csr_pages: vec!["spiflash".into()],
        })?;

        let (base, size) = self
            .map()?
            .region(SPIFLASH)
            .map(|r| (r.base, r.size))
            .unwrap_or_default();
        info!(
            mode = config.mode.as_str(),
            boot = format_args!("0x{boot:08X}"),
            "boot flash attached"
        );
        self.publish(BuildConstant::int("SPIFLASH_BASE", base));
        self.publish(BuildConstant::int("SPIFLASH_SIZE", size));
        self.publish(BuildConstant::int("FLASH_BOOT_ADDRESS", boot));
        self.publish(BuildConstant::string("SPIFLASH_MODE", config.mode.as_str()));
        self.publish(BuildConstant::int(
            "SPIFLASH_DUMMY_CYCLES",
            u64::from(config.dummy_cycles),
        ));
        Ok(binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attach::tests::ready;
    use ecpsoc_core::units::MIB;
    use ecpsoc_core::{ErrorKind, SpiMode, TargetConfiguration};

    fn flash(mode: SpiMode, reserved: u64) -> SpiFlashConfig {
        SpiFlashConfig {
            mode,
            dummy_cycles: 8,
            size_bytes: 4 * MIB,
            boot_reserved_bytes: reserved,
        }
    }

    fn boot_address(attacher: &PeripheralAttacher) -> Option<u64> {
        attacher
            .constants()
            .iter()
            .find(|c| c.name == "FLASH_BOOT_ADDRESS")
            .and_then(|c| c.as_int())
    }

    #[test]
    fn boot_address_skips_reserved_prefix() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        attacher.map_mut().unwrap().bind(SPIFLASH, 4 * MIB).unwrap();
        let binding = attacher.attach_spi_flash(&flash(SpiMode::X1, MIB)).unwrap();
        assert_eq!(binding.pads[0].name, "spiflash");
        assert_eq!(boot_address(&attacher), Some(0x2010_0000));
    }

    #[test]
    fn quad_mode_uses_quad_pads() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        attacher.map_mut().unwrap().bind(SPIFLASH, 4 * MIB).unwrap();
        let binding = attacher.attach_spi_flash(&flash(SpiMode::X4, MIB)).unwrap();
        assert_eq!(binding.pads[0].name, "spiflash4x");
    }

    #[test]
    fn unbound_flash_is_sequencing_error() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        let err = attacher.attach_spi_flash(&flash(SpiMode::X1, MIB)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequencing);
    }

    #[test]
    fn reserved_prefix_must_fit() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        attacher.map_mut().unwrap().bind(SPIFLASH, 4 * MIB).unwrap();
        let err = attacher
            .attach_spi_flash(&flash(SpiMode::X1, 4 * MIB))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert!(attacher.bindings().is_empty());
    }

    #[test]
    fn zero_dummy_cycles_rejected() {
        let config = TargetConfiguration::colorlight_baseline("t");
        let mut attacher = ready(&config);
        let mut cfg = flash(SpiMode::X4, MIB);
        cfg.dummy_cycles = 0;
        assert_eq!(
            attacher.attach_spi_flash(&cfg).unwrap_err().kind(),
            ErrorKind::Configuration
        );
    }
}
