// src/urls.rs

// dependencies
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

// documentation address (TEST-NET-1); connecting a UDP socket sends nothing
const ROUTE_PROBE: (Ipv4Addr, u16) = (Ipv4Addr::new(192, 0, 2, 1), 9);

// URLs a client could use to reach a server bound to `addr`; an unspecified address
// is expanded to every local IPv4 address
pub fn reachable_urls(addr: SocketAddr, tls: bool) -> Vec<String> {
    let scheme = if tls { "https" } else { "http" };
    let port = addr.port();

    let hosts: Vec<IpAddr> = if addr.ip().is_unspecified() {
        ipv4_hosts(interface_addrs())
    } else {
        vec![addr.ip()]
    };

    hosts
        .into_iter()
        .map(|ip| format!("{}://{}", scheme, SocketAddr::new(ip, port)))
        .collect()
}

// loopback first, then each other IPv4 address once, in interface order
pub fn ipv4_hosts<I>(addrs: I) -> Vec<IpAddr>
where
    I: IntoIterator<Item = IpAddr>,
{
    let mut hosts = vec![IpAddr::V4(Ipv4Addr::LOCALHOST)];
    for addr in addrs {
        if let IpAddr::V4(ip) = addr {
            let host = IpAddr::V4(ip);
            if !ip.is_loopback() && !ip.is_unspecified() && !hosts.contains(&host) {
                hosts.push(host);
            }
        }
    }
    hosts
}

fn interface_addrs() -> Vec<IpAddr> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces.iter().map(|iface| iface.ip()).collect(),
        Err(err) => {
            tracing::debug!(error = %err, "couldn't enumerate network interfaces");
            primary_ipv4().map(IpAddr::V4).into_iter().collect()
        }
    }
}

// address of the interface the default route goes out of
fn primary_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(ROUTE_PROBE).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() && !ip.is_loopback() => Some(ip),
        _ => None,
    }
}
