//! The closed set of baud rates a device may be opened at.

use super::error::PortError;
use std::fmt;

/// Supported line rates, in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaudRate {
    B2400,
    B4800,
    B7200,
    B9600,
    B14400,
    B19200,
    B28800,
    B38400,
    B57600,
    B76800,
    B115200,
    B230400,
}

impl BaudRate {
    /// Every supported rate, slowest first.
    pub const ALL: [BaudRate; 12] = [
        BaudRate::B2400,
        BaudRate::B4800,
        BaudRate::B7200,
        BaudRate::B9600,
        BaudRate::B14400,
        BaudRate::B19200,
        BaudRate::B28800,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B76800,
        BaudRate::B115200,
        BaudRate::B230400,
    ];

    /// Rate used when a device is opened by path without an explicit rate.
    pub const DEFAULT: BaudRate = BaudRate::B9600;

    /// The rate in bits per second.
    pub const fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B2400 => 2400,
            BaudRate::B4800 => 4800,
            BaudRate::B7200 => 7200,
            BaudRate::B9600 => 9600,
            BaudRate::B14400 => 14400,
            BaudRate::B19200 => 19200,
            BaudRate::B28800 => 28800,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B76800 => 76800,
            BaudRate::B115200 => 115200,
            BaudRate::B230400 => 230400,
        }
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = PortError;

    fn try_from(rate: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|b| b.bits_per_second() == rate)
            .ok_or(PortError::UnsupportedBaudRate(rate))
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.bits_per_second()
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits_per_second())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_rates_convert() {
        assert_eq!(BaudRate::try_from(115200).unwrap(), BaudRate::B115200);
        assert_eq!(BaudRate::try_from(7200).unwrap(), BaudRate::B7200);
        assert_eq!(u32::from(BaudRate::B230400), 230400);
    }

    #[test]
    fn test_unknown_rate_rejected() {
        let err = BaudRate::try_from(12345).unwrap_err();
        assert!(matches!(err, PortError::UnsupportedBaudRate(12345)));
    }

    #[test]
    fn test_all_is_sorted_and_round_trips() {
        let rates: Vec<u32> = BaudRate::ALL.iter().map(|b| b.bits_per_second()).collect();
        let mut sorted = rates.clone();
        sorted.sort_unstable();
        assert_eq!(rates, sorted);
        assert_eq!(BaudRate::default(), BaudRate::B9600);
    }
}
