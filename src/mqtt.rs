//! MQTT-backed trajectory source
//!
//! Publishes each request as JSON to `<topic>/request`. The service's answer
//! on `<topic>/response` is forwarded from a background thread over a
//! channel, which the frame loop polls without blocking.

use crate::config::MqttConfig;
use crate::error::{Error, Result};
use crate::trajectory::{
    Fetch, TrajectoryRequest, TrajectoryResponse, TrajectorySource, DEFAULT_RESPONSE_TIMEOUT_SECS,
};
use rumqttc::{Client, Event, MqttOptions, Packet, QoS};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_TOPIC: &str = "currentfield";

fn request_topic(base: &str) -> String {
    format!("{}/request", base.trim_end_matches('/'))
}

fn response_topic(base: &str) -> String {
    format!("{}/response", base.trim_end_matches('/'))
}

/// Trajectory service reached through an MQTT broker
pub struct MqttSource {
    client: Client,
    responses: Receiver<String>,
    host: String,
    port: u16,
    request_topic: String,
    timeout: Duration,
    _thread: thread::JoinHandle<()>,
}

impl MqttSource {
    /// Connect and subscribe to the response topic.
    /// Fails immediately if the broker cannot be reached.
    pub fn connect(config: &MqttConfig) -> Result<Self> {
        let host = config
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_HOST)
            .to_string();
        let port = config.port.unwrap_or(DEFAULT_PORT);
        let topic = config
            .topic
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TOPIC);
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_RESPONSE_TIMEOUT_SECS));

        let client_id = format!("currentfield-{}", std::process::id());
        let mut options = MqttOptions::new(client_id, host.clone(), port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_max_packet_size(16 * 1024 * 1024, 16 * 1024 * 1024);

        let (client, mut connection) = Client::new(options, 10);

        let response_topic = response_topic(topic);
        client
            .subscribe(response_topic.as_str(), QoS::AtLeastOnce)
            .map_err(|e| {
                Error::DataFetch(format!("failed to subscribe to '{}': {}", response_topic, e))
            })?;

        // Test connection by polling once - fail fast if broker unreachable
        match connection.iter().next() {
            Some(Ok(_)) => {},
            Some(Err(e)) => {
                return Err(Error::DataFetch(format!(
                    "failed to connect to MQTT broker at {}:{} - {}",
                    host, port, e
                )));
            },
            None => {
                return Err(Error::DataFetch(format!(
                    "failed to connect to MQTT broker at {}:{} - connection closed",
                    host, port
                )));
            },
        }

        let (sender, responses) = mpsc::channel();
        let topic_owned = response_topic.clone();
        let handle = thread::spawn(move || {
            Self::message_loop(connection, sender, &topic_owned);
        });

        log::info!("MQTT: connected to {}:{}, listening on '{}'", host, port, response_topic);

        Ok(Self {
            client,
            responses,
            host,
            port,
            request_topic: request_topic(topic),
            timeout,
            _thread: handle,
        })
    }

    fn message_loop(mut connection: rumqttc::Connection, sender: Sender<String>, topic: &str) {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if publish.topic != topic {
                        continue;
                    }
                    match String::from_utf8(publish.payload.to_vec()) {
                        Ok(text) => {
                            if sender.send(text).is_err() {
                                // Source dropped, exit
                                break;
                            }
                        },
                        Err(e) => log::warn!("MQTT: non-UTF-8 response dropped: {}", e),
                    }
                },
                Ok(_) => {},
                Err(e) => {
                    log::warn!("MQTT error: {}", e);
                    // Keep polling; rumqttc reconnects on the next iteration
                    thread::sleep(Duration::from_millis(500));
                },
            }
        }
    }

    /// Discard responses that arrived for earlier requests
    fn drain_stale(&self) {
        let mut stale = 0;
        while self.responses.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            log::debug!("MQTT: dropped {} stale response(s)", stale);
        }
    }
}

impl TrajectorySource for MqttSource {
    /// Publish the request; the answer is picked up later by `poll`
    fn request(&mut self, request: &TrajectoryRequest) -> Fetch {
        self.drain_stale();

        let published = serde_json::to_vec(request).map_err(Error::from).and_then(|payload| {
            self.client
                .publish(self.request_topic.as_str(), QoS::AtLeastOnce, false, payload)
                .map_err(|e| Error::DataFetch(format!("publish failed: {}", e)))
        });
        match published {
            Ok(()) => {
                log::debug!("MQTT: request published to '{}'", self.request_topic);
                Fetch::Pending
            },
            Err(e) => Fetch::Ready(Err(e)),
        }
    }

    fn poll(&mut self) -> Option<Result<TrajectoryResponse>> {
        match self.responses.try_recv() {
            Ok(text) => Some(TrajectoryResponse::parse(&text)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(Error::DataFetch("MQTT connection closed".to_string())))
            },
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn describe(&self) -> String {
        format!("mqtt {}:{} {}", self.host, self.port, self.request_topic)
    }
}
