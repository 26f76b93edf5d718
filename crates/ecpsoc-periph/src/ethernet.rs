//! RGMII Ethernet MAC and PHY attachment.
//!
//! The MAC exposes its packet buffers through the `ethmac` region: a fixed
//! number of receive and transmit slots, each one maximum frame long.

use ecpsoc_core::layout::ETHMAC;
use ecpsoc_core::{BuildConstant, EthernetConfig, Result, SocError};

use crate::attach::{AttachRequest, PeripheralAttacher};
use crate::binding::{PeripheralBinding, PeripheralKind, PeripheralMode};

pub const RX_SLOTS: u64 = 2;
pub const TX_SLOTS: u64 = 2;
pub const SLOT_SIZE: u64 = 2048;

/// Bytes of packet buffer mapped into the `ethmac` region.
pub const fn buffer_size() -> u64 {
    (RX_SLOTS + TX_SLOTS) * SLOT_SIZE
}

impl PeripheralAttacher {
    /// Attach the Ethernet MAC on `config.port` and bind its buffer region.
    pub fn attach_ethernet(&mut self, config: &EthernetConfig) -> Result<PeripheralBinding> {
        self.clocks()?;
        if config.tx_delay_ps == 0 {
            return Err(SocError::configuration("RGMII TX delay of 0 ps"));
        }
        let request = AttachRequest {
            peripheral: "ethmac".into(),
            kind: PeripheralKind::Ethernet,
            domain: "sys".into(),
            aux_domains: Vec::new(),
            region: ETHMAC.into(),
            mode: PeripheralMode::Ethernet {
                port: config.port,
                tx_delay_ps: config.tx_delay_ps,
            },
            pads: vec![
                ("eth_clocks".into(), config.port),
                ("eth".into(), config.port),
            ],
            csr_pages: vec!["ethphy".into(), "ethmac".into()],
        };
        self.check(&request, Some(buffer_size()))?;

        let region = self.map_mut()?.bind(ETHMAC, buffer_size())?;
        let binding = self.attach(request)?;

        self.publish(BuildConstant::int("ETHMAC_BASE", region.base));
        self.publish(BuildConstant::int("ETHMAC_SIZE", region.size));
        self.publish(BuildConstant::int("ETHMAC_RX_SLOTS", RX_SLOTS));
        self.publish(BuildConstant::int("ETHMAC_TX_SLOTS", TX_SLOTS));
        self.publish(BuildConstant::int("ETHMAC_SLOT_SIZE", SLOT_SIZE));
        self.publish(BuildConstant::int(
            "ETHPHY_TX_DELAY_PS",
            u64::from(config.tx_delay_ps),
        ));
        Ok(binding)
    }
}
