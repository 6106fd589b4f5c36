//! The gateway protocol engine.
//!
//! [`Engine`] owns all mutable protocol state: the registry, the commanders
//! and the event dispatcher. It is driven by three entry points: inbound
//! datagrams ([`Engine::handle_datagram`]), timers ([`Engine::discover`],
//! [`Engine::sweep`]) and set requests from the accessory directory
//! ([`Engine::set`]). Each call runs to completion before the next one, so
//! no locking is needed.

use std::net::SocketAddr;
use std::time::Instant;

use crate::commander::{Commander, CommanderTable, SendOutcome};
use crate::config::Config;
use crate::discovery::Discovery;
use crate::error::{Error, Result};
use crate::event::{Event, EventDispatcher, EventFilter, Subscription};
use crate::parser::{ParseContext, ParserKind};
use crate::protocol::{Message, Report, parse_message};
use crate::registry::Registry;
use crate::sweeper::Sweeper;
use crate::transport::Transport;
use crate::types::{Accessory, AccessoryKey, AccessoryKind, Battery};

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Gateway protocol engine.
pub struct Engine<T: Transport> {
    config: Config,
    registry: Registry,
    commanders: CommanderTable,
    discovery: Discovery,
    sweeper: Sweeper,
    events: EventDispatcher,
    transport: T,
}

impl<T: Transport> Engine<T> {
    /// Creates an engine and loads the configured gateway passwords.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway credentials in `config` are invalid.
    pub fn new(config: Config, transport: T) -> Result<Self> {
        let mut registry = Registry::new();
        for (sid, password) in config.gateway_passwords()? {
            registry.set_password(&sid, password);
        }

        Ok(Self {
            discovery: config.discovery(),
            sweeper: config.sweeper(),
            config,
            registry,
            commanders: CommanderTable::new(),
            events: EventDispatcher::new(DEFAULT_EVENT_CAPACITY),
            transport,
        })
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the commanders.
    #[must_use]
    pub const fn commanders(&self) -> &CommanderTable {
        &self.commanders
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the discovery settings.
    #[must_use]
    pub const fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Returns the sweeper settings.
    #[must_use]
    pub const fn sweeper(&self) -> &Sweeper {
        &self.sweeper
    }

    /// Returns the event dispatcher.
    #[must_use]
    pub const fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Subscribes to engine events.
    #[must_use]
    pub fn subscribe(&self, filter: Option<EventFilter>) -> Subscription {
        self.events.subscribe(filter)
    }

    // ==================== Inbound ====================

    /// Handles one inbound datagram.
    ///
    /// Malformed datagrams are logged and dropped.
    pub fn handle_datagram(&mut self, datagram: &[u8], from: SocketAddr, now: Instant) {
        tracing::trace!("<- {from}: {}", String::from_utf8_lossy(datagram));

        match parse_message(datagram) {
            Ok(message) => self.handle_message(message, from, now),
            Err(e) => tracing::warn!("dropping datagram from {from}: {}", e),
        }
    }

    /// Handles one classified message.
    pub fn handle_message(&mut self, message: Message, from: SocketAddr, now: Instant) {
        match message {
            Message::Iam { sid, ip, port } => {
                if let Err(e) = self.discovery.handle_iam(
                    &mut self.registry,
                    sid.as_deref(),
                    ip,
                    port,
                    now,
                    &self.transport,
                ) {
                    tracing::warn!("failed to request device list from {ip}:{port}: {}", e);
                }
            }
            Message::IdListAck {
                sid,
                token,
                devices,
            } => {
                if let Err(e) = self.discovery.handle_id_list(
                    &mut self.registry,
                    &sid,
                    token.as_deref(),
                    &devices,
                    from,
                    now,
                    &self.transport,
                ) {
                    tracing::warn!("failed to read devices of gateway {sid}: {}", e);
                }
                self.events.dispatch(Event::GatewayDiscovered {
                    sid,
                    addr: from,
                    devices: devices.len(),
                });
            }
            Message::Heartbeat { sid, model, token } => {
                self.discovery.handle_heartbeat(
                    &mut self.registry,
                    &sid,
                    &model,
                    token.as_deref(),
                    now,
                );
            }
            Message::WriteAck => {
                tracing::debug!("write acknowledged by {from}");
                self.events.dispatch(Event::WriteAck);
            }
            Message::Report(report) => self.handle_report(&report, now),
        }
    }

    fn handle_report(&mut self, report: &Report, now: Instant) {
        if report.model.is_gateway() {
            self.registry.upsert_gateway(&report.sid, None, None, now);
            tracing::debug!("report from gateway {}", report.sid);
            return;
        }

        // bookkeeping first: parsers read the battery cached from this report
        self.registry
            .upsert_device(&report.sid, None, report.data.voltage())
            .model = Some(report.model.clone());
        for key_prefix in report.model.accessory_prefixes() {
            self.registry
                .touch(&AccessoryKey::new(key_prefix, &report.sid), &report.sid, now);
        }
        if let Some(gateway_sid) = self.registry.gateway_of(&report.sid).map(str::to_owned) {
            self.registry.upsert_gateway(&gateway_sid, None, None, now);
        }

        let Some(parser) = ParserKind::for_model(&report.model).parser() else {
            tracing::debug!("no parser for model {}({})", report.model, report.sid);
            return;
        };

        let mut ctx = ParseContext {
            battery: self
                .registry
                .battery_of(&report.sid)
                .map(Battery::from_millivolts),
            commanders: &mut self.commanders,
        };
        let readings = parser.decode(report, &mut ctx);

        for reading in readings {
            self.announce(&reading.key, &report.sid);
            self.events.dispatch(Event::Reading(reading));
        }
    }

    /// Emits [`Event::AccessoryAdded`] the first time an accessory produces
    /// a reading.
    fn announce(&mut self, key: &AccessoryKey, device_sid: &str) {
        if !self.registry.mark_announced(key) {
            return;
        }

        let Some(kind) = key
            .as_str()
            .strip_suffix(device_sid)
            .and_then(AccessoryKind::from_prefix)
        else {
            tracing::debug!("accessory {key} has no known kind");
            return;
        };

        let accessory = Accessory {
            key: key.clone(),
            device_sid: device_sid.to_string(),
            kind,
            category: kind.category(self.config.light_switch_as_bulb),
            name: self.config.display_name(device_sid, kind),
        };
        tracing::info!("new accessory {} \"{}\"", accessory.key, accessory.name);
        self.events.dispatch(Event::AccessoryAdded(accessory));
    }

    // ==================== Timers ====================

    /// Broadcasts a discovery request.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the datagram.
    pub fn discover(&self) -> Result<()> {
        self.discovery.broadcast_whois(&self.transport)
    }

    /// Evicts stale accessories and reports them as one batch.
    pub fn sweep(&mut self, now: Instant) -> Vec<AccessoryKey> {
        let removed = self.sweeper.sweep(&mut self.registry, now);
        if !removed.is_empty() {
            self.events
                .dispatch(Event::AccessoriesRemoved(removed.clone()));
        }
        removed
    }

    // ==================== Set requests ====================

    /// Requests a new on/off state for a controllable accessory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAccessory`] if no channel backs the accessory
    /// yet, and any error of [`Commander::send`].
    pub fn set(&mut self, key: &AccessoryKey, on: bool) -> Result<SendOutcome> {
        let commander =
            self.commanders
                .for_accessory_mut(key)
                .ok_or_else(|| Error::UnknownAccessory {
                    key: key.to_string(),
                })?;

        let outcome = commander.send(on, &self.registry, &self.transport)?;
        if outcome == SendOutcome::Sent {
            let event = Event::WriteSent {
                sid: commander.device_sid().to_string(),
                channel: commander.channel().to_string(),
                on,
            };
            self.events.dispatch(event);
        }
        Ok(outcome)
    }
}
