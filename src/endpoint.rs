// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Client/server addressing of one exchange.

use crate::record::{Direction, PacketRecord};
use std::fmt;
use std::net::SocketAddr;

/// The client->server direction of a TCP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub client: SocketAddr,
    pub server: SocketAddr,
}

impl Endpoints {
    pub fn new(client: SocketAddr, server: SocketAddr) -> Self {
        Self { client, server }
    }

    /// Requests travel client->server; responses are swapped back.
    pub fn of(record: &PacketRecord) -> Self {
        match record.direction() {
            Direction::Request => Self::new(record.src, record.dst),
            Direction::Response => Self::new(record.dst, record.src),
        }
    }
}

impl fmt::Display for Endpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.client, self.server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_request, make_response};

    #[test]
    fn request_and_response_agree() {
        let req = make_request(1, "GET", "/", &[], "");
        let res = make_response(1, 200, &[], "");
        assert_eq!(Endpoints::of(&req), Endpoints::of(&res));
    }

    #[test]
    fn display_is_client_then_server() {
        let e = Endpoints::new(
            "192.168.1.5:51234".parse().expect("addr"),
            "192.168.1.9:8080".parse().expect("addr"),
        );
        assert_eq!(e.to_string(), "192.168.1.5:51234 192.168.1.9:8080");
    }

    #[test]
    fn ipv6_addresses_are_bracketed() {
        let e = Endpoints::new(
            "[::1]:40000".parse().expect("addr"),
            "[::1]:8080".parse().expect("addr"),
        );
        assert_eq!(e.to_string(), "[::1]:40000 [::1]:8080");
    }
}
