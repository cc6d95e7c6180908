//! RowerCommand - operator command channel

use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// External operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowerCommand {
    /// Ask the device itself to reset (distinct from the engine's state reset)
    ResetDevice,
    /// Update the external heart-rate override (bpm)
    SetHeartRate(u32),
}

impl FromStr for RowerCommand {
    type Err = ContractError;

    /// Parse the textual form.
    ///
    /// Accepted: `reset_device`, `reset_ble`, `hr <bpm>`, `set_heart_rate <bpm>`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let cmd = parts
            .next()
            .ok_or_else(|| ContractError::invalid_command(line, "empty command"))?;

        match cmd {
            "reset_device" | "reset_ble" => Ok(Self::ResetDevice),
            "hr" | "set_heart_rate" => {
                let raw = parts
                    .next()
                    .ok_or_else(|| ContractError::invalid_command(line, "missing heart rate"))?;
                let bpm = raw.parse::<u32>().map_err(|e| {
                    ContractError::invalid_command(line, format!("bad heart rate '{raw}': {e}"))
                })?;
                Ok(Self::SetHeartRate(bpm))
            }
            other => Err(ContractError::invalid_command(
                line,
                format!("unknown command '{other}'"),
            )),
        }
    }
}

impl fmt::Display for RowerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResetDevice => f.write_str("reset_device"),
            Self::SetHeartRate(bpm) => write!(f, "set_heart_rate {bpm}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reset_aliases() {
        assert_eq!(
            "reset_ble".parse::<RowerCommand>().unwrap(),
            RowerCommand::ResetDevice
        );
        assert_eq!(
            "  reset_device ".parse::<RowerCommand>().unwrap(),
            RowerCommand::ResetDevice
        );
    }

    #[test]
    fn test_parse_heart_rate() {
        assert_eq!(
            "hr 72".parse::<RowerCommand>().unwrap(),
            RowerCommand::SetHeartRate(72)
        );
        assert_eq!(
            "set_heart_rate 150".parse::<RowerCommand>().unwrap(),
            RowerCommand::SetHeartRate(150)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<RowerCommand>().is_err());
        assert!("hr".parse::<RowerCommand>().is_err());
        assert!("hr fast".parse::<RowerCommand>().is_err());
        let err = "jump".parse::<RowerCommand>().unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }

    #[test]
    fn test_display_parses_back() {
        for cmd in [RowerCommand::ResetDevice, RowerCommand::SetHeartRate(88)] {
            assert_eq!(cmd.to_string().parse::<RowerCommand>().unwrap(), cmd);
        }
    }
}
