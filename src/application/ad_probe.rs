//! Extended A/D range probe — the composed sequence behind `ioctl` selector
//! 9. Built entirely from the Session's own read/write/ioctl primitives; it
//! defines no new wire operation of its own (§4.3, design notes in §9).

use crate::domain::{AdConfig, AdMode, AdRange, ReadKind, SlaveId, StartAddress, WriteKind};
use crate::error::{Error, Result};

use super::session::Session;

/// Value written to a D/A channel during the probe: roughly 1V of a 12-bit
/// 0..0xFFF output range.
const PROBE_DAC_VALUE: u16 = 0x0199;

/// The four classification bands the probe can return, each mapping a
/// readback window to the A/D range and multiplier state that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeBand {
    Range0To10VMultiplierOff,
    Range0To5VMultiplierOff,
    Range0To10VMultiplierOn,
    Range0To5VMultiplierOn,
}

fn classify(readback: u16) -> Option<ProbeBand> {
    match readback {
        0x171..=0x1C1 => Some(ProbeBand::Range0To10VMultiplierOff),
        0xB8..=0xE0 => Some(ProbeBand::Range0To5VMultiplierOff),
        0xE66..=0xFFF => Some(ProbeBand::Range0To10VMultiplierOn),
        0x737..=0x8C7 => Some(ProbeBand::Range0To5VMultiplierOn),
        _ => None,
    }
}

fn encode_ad_config(cfg: AdConfig) -> [u8; 5] {
    let mode = match cfg.mode {
        AdMode::SingleEnded => 0u8,
        AdMode::Differential => 1u8,
    };
    let range = match cfg.range {
        AdRange::Range0To5V => 0u8,
        AdRange::Range0To10V => 1u8,
    };
    [cfg.channel, mode, range, 0, 0]
}

fn decode_ad_config(raw: &[u8]) -> Result<AdConfig> {
    if raw.len() < 3 {
        return Err(Error::FramingError("A/D config response too short".into()));
    }
    Ok(AdConfig {
        channel: raw[0],
        mode: if raw[1] == 0 { AdMode::SingleEnded } else { AdMode::Differential },
        range: if raw[2] == 0 { AdRange::Range0To5V } else { AdRange::Range0To10V },
    })
}

/// Probe `channel_count` D/A channels on `slave`, restoring the original
/// A/D configuration and zeroing the D/A outputs before returning.
///
/// `channel_count` is 2 for modules with onboard D/A, 0 otherwise; the
/// device-model-to-channel-count mapping is not part of the wire protocol,
/// so the caller supplies it rather than having it guessed from a response
/// byte layout the source does not actually define.
pub fn run_extended_probe(
    session: &Session,
    slave: SlaveId,
    channel_count: u8,
) -> Result<Vec<ProbeBand>> {
    let original = read_ad_config(session, slave)?;
    let mut bands = Vec::with_capacity(channel_count as usize);

    let outcome: Result<()> = (|| {
        for channel in 0..channel_count {
            let result = probe_one_channel(session, slave, channel);
            zero_dac(session, slave, channel)?;
            bands.push(result?);
        }
        Ok(())
    })();

    // Restore the original A/D config unconditionally, even if a channel
    // probe or the zeroing write above failed.
    write_ad_config(session, slave, original)?;
    outcome?;
    Ok(bands)
}

fn probe_one_channel(session: &Session, slave: SlaveId, channel: u8) -> Result<ProbeBand> {
    write_dac(session, slave, channel, PROBE_DAC_VALUE)?;

    write_ad_config(
        session,
        slave,
        AdConfig {
            channel,
            mode: AdMode::SingleEnded,
            range: AdRange::Range0To10V,
        },
    )?;

    let mut raw = [0u8; 2];
    session.read(
        slave,
        ReadKind::InputRegisters,
        StartAddress(channel as u16 + 1),
        1,
        &mut raw,
    )?;
    let readback = u16::from_be_bytes(raw);

    classify(readback)
        .ok_or_else(|| Error::NotReady(format!("A/D probe readback 0x{readback:03X} out of band")))
}

fn read_ad_config(session: &Session, slave: SlaveId) -> Result<AdConfig> {
    let payload = session.ioctl_raw(slave, crate::domain::IoctlKind::GetAdConfig, &[])?;
    decode_ad_config(&payload)
}

fn write_ad_config(session: &Session, slave: SlaveId, cfg: AdConfig) -> Result<()> {
    session.ioctl_raw(slave, crate::domain::IoctlKind::SetAdConfig, &encode_ad_config(cfg))?;
    Ok(())
}

fn write_dac(session: &Session, slave: SlaveId, channel: u8, value: u16) -> Result<()> {
    session.write(
        slave,
        WriteKind::HoldingRegisters,
        StartAddress(channel as u16 + 1),
        1,
        &value.to_be_bytes(),
    )?;
    Ok(())
}

fn zero_dac(session: &Session, slave: SlaveId, channel: u8) -> Result<()> {
    write_dac(session, slave, channel, 0)
}
