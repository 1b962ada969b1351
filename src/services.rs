//! Well-known service names for scan output.
//!
//! Static tables keyed by port number, split by protocol the way the
//! system services database is. Consulted only when formatting final
//! results, never during scheduling or probing.

use crate::cli::Protocol;
use std::collections::HashMap;
use std::sync::LazyLock;

static TCP_SERVICES: LazyLock<HashMap<u16, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (20, "ftp-data"),
        (21, "ftp"),
        (22, "ssh"),
        (23, "telnet"),
        (25, "smtp"),
        (53, "domain"),
        (80, "http"),
        (88, "kerberos"),
        (110, "pop3"),
        (111, "rpcbind"),
        (119, "nntp"),
        (135, "msrpc"),
        (139, "netbios-ssn"),
        (143, "imap"),
        (179, "bgp"),
        (389, "ldap"),
        (443, "https"),
        (445, "microsoft-ds"),
        (465, "smtps"),
        (515, "printer"),
        (548, "afp"),
        (587, "submission"),
        (631, "ipp"),
        (636, "ldaps"),
        (873, "rsync"),
        (993, "imaps"),
        (995, "pop3s"),
        (1080, "socks"),
        (1433, "mssql"),
        (1521, "oracle"),
        (1883, "mqtt"),
        (2049, "nfs"),
        (2181, "zookeeper"),
        (2375, "docker"),
        (3128, "squid"),
        (3306, "mysql"),
        (3389, "rdp"),
        (5060, "sip"),
        (5432, "postgresql"),
        (5672, "amqp"),
        (5900, "vnc"),
        (6379, "redis"),
        (8080, "http-proxy"),
        (8443, "https-alt"),
        (9092, "kafka"),
        (9200, "elasticsearch"),
        (9418, "git"),
        (11211, "memcached"),
        (27017, "mongodb"),
    ])
});

static UDP_SERVICES: LazyLock<HashMap<u16, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (53, "domain"),
        (67, "bootps"),
        (68, "bootpc"),
        (69, "tftp"),
        (123, "ntp"),
        (137, "netbios-ns"),
        (138, "netbios-dgm"),
        (161, "snmp"),
        (162, "snmptrap"),
        (500, "isakmp"),
        (514, "syslog"),
        (520, "route"),
        (1194, "openvpn"),
        (1900, "ssdp"),
        (4500, "ipsec-nat-t"),
        (5353, "mdns"),
    ])
});

/// Look up the well-known service name for a port, if any.
pub fn lookup(port: u16, protocol: Protocol) -> Option<&'static str> {
    match protocol {
        Protocol::Tcp => TCP_SERVICES.get(&port).copied(),
        Protocol::Udp => UDP_SERVICES.get(&port).copied(),
    }
}
