use futures_util::Stream;
use std::fmt;
use std::net::IpAddr;
use std::pin::Pin;

pub type GenericBoxedStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// IP family a BGP daemon instance serves. BIRD runs one daemon per family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub const ALL: [AddressFamily; 2] = [AddressFamily::Ipv4, AddressFamily::Ipv6];

    /// Character that separates address groups once the underscores of an
    /// encoded peer name are rewritten.
    pub fn delimiter(self) -> char {
        match self {
            AddressFamily::Ipv4 => '.',
            AddressFamily::Ipv6 => ':',
        }
    }

    /// Name of the BIRD process serving this family.
    pub fn bird_process(self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "bird",
            AddressFamily::Ipv6 => "bird6",
        }
    }

    /// File name of the BIRD control socket for this family.
    pub fn bird_socket_name(self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "bird.ctl",
            AddressFamily::Ipv6 => "bird6.ctl",
        }
    }

    pub fn contains(self, addr: &IpAddr) -> bool {
        matches!(
            (self, addr),
            (AddressFamily::Ipv4, IpAddr::V4(_)) | (AddressFamily::Ipv6, IpAddr::V6(_))
        )
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "4"),
            AddressFamily::Ipv6 => write!(f, "6"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_selects_socket_and_delimiter() {
        assert_eq!(AddressFamily::Ipv4.delimiter(), '.');
        assert_eq!(AddressFamily::Ipv6.delimiter(), ':');
        assert_eq!(AddressFamily::Ipv4.bird_socket_name(), "bird.ctl");
        assert_eq!(AddressFamily::Ipv6.bird_socket_name(), "bird6.ctl");
        assert_eq!(AddressFamily::Ipv6.to_string(), "6");
    }

    #[test]
    fn family_contains_matching_addresses() {
        let v4: IpAddr = "10.0.0.1".parse().unwrap();
        let v6: IpAddr = "fd80::2".parse().unwrap();
        assert!(AddressFamily::Ipv4.contains(&v4));
        assert!(!AddressFamily::Ipv4.contains(&v6));
        assert!(AddressFamily::Ipv6.contains(&v6));
    }
}
