use crate::{Error, Result};

/// RTMP version byte carried by C0/S0 (the only version this engine speaks).
pub const VERSION: u8 = 3;

/// Bytes this engine stamps into S1's first four bytes and expects (loosely)
/// to see echoed back at the front of C1. Chosen to match a widely deployed
/// RTMP server's simple-handshake reply; clients never validate it.
pub const SERVER_VERSION: [u8; 4] = [1, 0, 2, 6];

const HANDSHAKE_SIZE: usize = 1536;

/// Drives the fixed (non-digest) RTMP handshake byte by byte. Complex,
/// HMAC-digest handshakes are out of scope; any C1 is accepted as long as it
/// is 1536 bytes, and only C2's leading bytes are checked.
#[derive(Debug, Default)]
pub struct Handshake {
    c0: bool,
    c1: bool,
    c2: bool,
}

impl Handshake {
    pub fn new() -> Self {
        Handshake { c0: false, c1: false, c2: false }
    }

    pub fn is_done(&self) -> bool {
        self.c2
    }

    /// Feeds newly available bytes through the handshake. Returns
    /// `(consumed, reply)`; `consumed == 0` means more bytes are needed before
    /// any progress can be made.
    pub fn on_bytes(&mut self, data: &[u8]) -> Result<(usize, Vec<u8>)> {
        if !self.c0 {
            return self.handle_c0(data);
        }
        if !self.c1 {
            return self.handle_c1(data);
        }
        self.handle_c2(data)
    }

    fn handle_c0(&mut self, data: &[u8]) -> Result<(usize, Vec<u8>)> {
        if data.is_empty() {
            return Ok((0, Vec::new()));
        }
        if data[0] != VERSION {
            return Err(Error::framing(format!("unsupported handshake version {}", data[0])));
        }
        // C0 and C1 commonly arrive in the same read; reply with S0+S1+S2 together
        // when that's the case, otherwise just S0+S1 and wait for C1 separately.
        if data.len() >= 1 + HANDSHAKE_SIZE {
            let c1 = &data[1..1 + HANDSHAKE_SIZE];
            self.c0 = true;
            self.c1 = true;
            let mut reply = generate_s0_s1();
            reply.extend_from_slice(&generate_s2(c1));
            return Ok((1 + HANDSHAKE_SIZE, reply));
        }
        self.c0 = true;
        Ok((1, generate_s0_s1()))
    }

    fn handle_c1(&mut self, data: &[u8]) -> Result<(usize, Vec<u8>)> {
        if data.len() < HANDSHAKE_SIZE {
            return Ok((0, Vec::new()));
        }
        let c1 = &data[..HANDSHAKE_SIZE];
        self.c1 = true;
        Ok((HANDSHAKE_SIZE, generate_s2(c1)))
    }

    fn handle_c2(&mut self, data: &[u8]) -> Result<(usize, Vec<u8>)> {
        if data.len() < HANDSHAKE_SIZE {
            return Ok((0, Vec::new()));
        }
        check_c2(&data[..HANDSHAKE_SIZE])?;
        self.c2 = true;
        Ok((HANDSHAKE_SIZE, Vec::new()))
    }
}

fn generate_s0_s1() -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + HANDSHAKE_SIZE);
    out.push(VERSION);
    out.extend_from_slice(&SERVER_VERSION);
    out.extend(std::iter::repeat(0u8).take(HANDSHAKE_SIZE - SERVER_VERSION.len()));
    out
}

/// S2 is C1 echoed back verbatim. A missing/unexpected version prefix is
/// logged, not rejected: only C2 is checked strictly.
fn generate_s2(c1: &[u8]) -> Vec<u8> {
    if c1.len() < 4 || c1[0..4] != SERVER_VERSION[..] {
        log::warn!("C1 does not start with the expected version prefix, echoing it anyway");
    }
    c1.to_vec()
}

fn check_c2(c2: &[u8]) -> Result<()> {
    if c2.len() < 4 || c2[0..4] != SERVER_VERSION[..] {
        return Err(Error::framing("C2 does not carry the expected version prefix"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c0_c1_together_yields_s0_s1_s2() {
        let mut hs = Handshake::new();
        let mut c0c1 = vec![VERSION];
        c0c1.extend(std::iter::repeat(0xABu8).take(HANDSHAKE_SIZE));
        let (consumed, reply) = hs.on_bytes(&c0c1).unwrap();
        assert_eq!(consumed, 1 + HANDSHAKE_SIZE);
        assert_eq!(reply.len(), 1 + HANDSHAKE_SIZE + HANDSHAKE_SIZE);
        assert_eq!(reply[0], VERSION);
        assert_eq!(&reply[1..5], &SERVER_VERSION);
        assert!(!hs.is_done());
    }

    #[test]
    fn c0_alone_yields_s0_s1_only() {
        let mut hs = Handshake::new();
        let (consumed, reply) = hs.on_bytes(&[VERSION]).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(reply.len(), 1 + HANDSHAKE_SIZE);

        let c1 = vec![0xCDu8; HANDSHAKE_SIZE];
        let (consumed, reply) = hs.on_bytes(&c1).unwrap();
        assert_eq!(consumed, HANDSHAKE_SIZE);
        assert_eq!(reply, c1);
    }

    #[test]
    fn full_handshake_completes_on_valid_c2() {
        let mut hs = Handshake::new();
        hs.on_bytes(&[VERSION]).unwrap();
        hs.on_bytes(&[0xCDu8; HANDSHAKE_SIZE]).unwrap();

        let mut c2 = SERVER_VERSION.to_vec();
        c2.extend(std::iter::repeat(0u8).take(HANDSHAKE_SIZE - 4));
        let (consumed, reply) = hs.on_bytes(&c2).unwrap();
        assert_eq!(consumed, HANDSHAKE_SIZE);
        assert!(reply.is_empty());
        assert!(hs.is_done());
    }

    #[test]
    fn invalid_c2_prefix_is_rejected() {
        let mut hs = Handshake::new();
        hs.on_bytes(&[VERSION]).unwrap();
        hs.on_bytes(&[0xCDu8; HANDSHAKE_SIZE]).unwrap();

        let bad_c2 = vec![0u8; HANDSHAKE_SIZE];
        assert!(hs.on_bytes(&bad_c2).is_err());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut hs = Handshake::new();
        assert!(hs.on_bytes(&[9]).is_err());
    }

    #[test]
    fn incomplete_c1_requests_more_bytes() {
        let mut hs = Handshake::new();
        hs.on_bytes(&[VERSION]).unwrap();
        let (consumed, reply) = hs.on_bytes(&[0xCDu8; HANDSHAKE_SIZE - 1]).unwrap();
        assert_eq!(consumed, 0);
        assert!(reply.is_empty());
    }
}
