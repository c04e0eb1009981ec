//! Randomization command emitter
//!
//! Sends a bounded number of `/random <n>` messages (n uniform in 1..=100)
//! to the synth patch, pausing briefly after each one, then waits a drain
//! interval so the listener can log the patch's last responses.
//!
//! The protocol is fire-and-forget: failed sends are logged and skipped,
//! never retried, and nothing is acknowledged.

use crate::codec::encode_random;
use crate::error::{Error, Result};
use crate::shutdown::ShutdownSignal;
use rand::Rng;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Range of randomization values
pub const RANDOM_RANGE: RangeInclusive<i32> = 1..=100;

/// Outbound datagram transport
pub trait CommandSink {
    /// Send one encoded OSC datagram
    fn send(&mut self, datagram: &[u8]) -> Result<()>;
}

/// UDP sink bound to an ephemeral local port
pub struct UdpCommandSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpCommandSink {
    /// Resolve `host:port` and bind a local socket of the same address family
    pub fn connect(endpoint: &str) -> Result<Self> {
        let target = endpoint
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::Resolve(endpoint.to_string()))?;

        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)?;

        log::info!("Sending commands to {}", target);
        Ok(Self { socket, target })
    }
}

impl CommandSink for UdpCommandSink {
    fn send(&mut self, datagram: &[u8]) -> Result<()> {
        let sent = self.socket.send_to(datagram, self.target)?;
        if sent != datagram.len() {
            return Err(Error::ShortSend {
                target: self.target,
                sent,
                len: datagram.len(),
            });
        }
        Ok(())
    }
}

/// Pauses between and after sends
#[derive(Debug, Clone, Copy)]
pub struct EmitterTiming {
    /// Pause after each send so the patch is not flooded
    pub interval: Duration,
    /// Final pause for in-flight responses
    pub drain: Duration,
}

impl Default for EmitterTiming {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(10),
            drain: Duration::from_millis(500),
        }
    }
}

/// Outcome of an emission run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmitReport {
    /// Emission cycles started
    pub attempted: u32,
    pub sent: u32,
    pub failed: u32,
    /// Run was cut short by a shutdown request
    pub interrupted: bool,
}

/// Sends a fixed number of randomization commands
pub struct CommandEmitter<S: CommandSink> {
    sink: S,
    count: u32,
    timing: EmitterTiming,
}

impl<S: CommandSink> CommandEmitter<S> {
    pub fn with_timing(sink: S, count: u32, timing: EmitterTiming) -> Self {
        Self {
            sink,
            count,
            timing,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run all emission cycles, then the drain wait
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> EmitReport {
        let mut report = EmitReport::default();
        let mut rng = rand::rng();

        for i in 1..=self.count {
            if shutdown.is_triggered() {
                report.interrupted = true;
                return report;
            }

            log::info!(
                "Sending randomization command (iteration {}/{})",
                i,
                self.count
            );
            report.attempted += 1;

            let value = rng.random_range(RANDOM_RANGE);
            match encode_random(value).and_then(|bytes| self.sink.send(&bytes)) {
                Ok(()) => {
                    log::debug!("Sent /random {}", value);
                    report.sent += 1;
                }
                Err(e) => {
                    log::error!("Failed to send OSC message: {}", e);
                    report.failed += 1;
                }
            }

            if shutdown.wait(self.timing.interval) {
                report.interrupted = true;
                return report;
            }
        }

        log::info!("Waiting for final responses...");
        if shutdown.wait(self.timing.drain) {
            report.interrupted = true;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::shutdown_channel;
    use rosc::{OscPacket, OscType};

    /// Records datagrams, failing the sends whose index is listed
    #[derive(Default)]
    struct RecordingSink {
        calls: usize,
        fail_on: Vec<usize>,
        sent: Vec<Vec<u8>>,
    }

    impl CommandSink for RecordingSink {
        fn send(&mut self, datagram: &[u8]) -> Result<()> {
            let call = self.calls;
            self.calls += 1;
            if self.fail_on.contains(&call) {
                return Err(Error::Io(std::io::Error::other("network unreachable")));
            }
            self.sent.push(datagram.to_vec());
            Ok(())
        }
    }

    fn fast() -> EmitterTiming {
        EmitterTiming {
            interval: Duration::from_millis(1),
            drain: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_sends_exactly_n_values_in_range() {
        let (_trigger, signal) = shutdown_channel();
        let mut emitter = CommandEmitter::with_timing(RecordingSink::default(), 25, fast());

        let report = emitter.run(&signal);
        assert_eq!(report.attempted, 25);
        assert_eq!(report.sent, 25);
        assert!(!report.interrupted);

        for bytes in &emitter.sink().sent {
            let (_, packet) = rosc::decoder::decode_udp(bytes).unwrap();
            let OscPacket::Message(msg) = packet else {
                panic!("expected a message");
            };
            assert_eq!(msg.addr, "/random");
            assert_eq!(msg.args.len(), 1);
            match msg.args[0] {
                OscType::Int(v) => assert!(RANDOM_RANGE.contains(&v), "out of range: {}", v),
                ref other => panic!("expected int, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_failed_send_does_not_abort_loop() {
        let (_trigger, signal) = shutdown_channel();
        let sink = RecordingSink {
            fail_on: vec![0, 2],
            ..Default::default()
        };
        let mut emitter = CommandEmitter::with_timing(sink, 5, fast());

        let report = emitter.run(&signal);
        assert_eq!(report.attempted, 5);
        assert_eq!(report.failed, 2);
        assert_eq!(report.sent, 3);
        assert_eq!(emitter.sink().calls, 5);
    }

    #[test]
    fn test_zero_count_sends_nothing() {
        let (_trigger, signal) = shutdown_channel();
        let mut emitter = CommandEmitter::with_timing(RecordingSink::default(), 0, fast());

        assert_eq!(emitter.run(&signal), EmitReport::default());
    }

    #[test]
    fn test_interrupt_stops_loop() {
        let (trigger, signal) = shutdown_channel();
        trigger.trigger();
        let mut emitter = CommandEmitter::with_timing(RecordingSink::default(), 10, fast());

        let report = emitter.run(&signal);
        assert!(report.interrupted);
        assert_eq!(report.attempted, 0);
    }

    #[test]
    fn test_default_timing() {
        let timing = EmitterTiming::default();
        assert_eq!(timing.interval, Duration::from_millis(10));
        assert_eq!(timing.drain, Duration::from_millis(500));
    }

    #[test]
    fn test_udp_sink_delivers() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let endpoint = receiver.local_addr().unwrap().to_string();
        let mut sink = UdpCommandSink::connect(&endpoint).unwrap();

        sink.send(&encode_random(7).unwrap()).unwrap();

        let mut buf = [0u8; rosc::decoder::MTU];
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..len]).unwrap();
        assert!(matches!(packet, OscPacket::Message(m) if m.args == vec![OscType::Int(7)]));
    }
}
