//! Describe a coupled run in configuration rather than code.
//!
//! A [`CouplingConfig`] names the port maps, chains and recurring events of a run.
//! It only refers to ports by name; the ports themselves are created by the caller and handed
//! over in a [`PortCatalog`] when the configuration is built into an [`EventManager`].
//!
//! ```toml
//! [[map]]
//! name = "earth_to_air"
//! src = "earth"
//! dst = "air"
//! vars = [["air__density", "earth_surface__temperature"]]
//!
//! [[chain]]
//! name = "air_step"
//! events = ["air", "earth_to_air"]
//!
//! [[schedule]]
//! event = "air_step"
//! interval = 1.0
//!
//! [[schedule]]
//! event = "earth"
//! interval = 1.2
//! ```
//!
//! Every port in the catalog is available as an event with the port's name that steps the
//! port.
//! That event is shared, so a port referenced from several chains is stepped by the same
//! event.

use crate::errors::{CMTError, CMTResult};
use crate::events::{ChainEvent, EventHandle, EventManager, PortEvent, PortMapEvent};
use crate::grid::Time;
use crate::port::{port_name, PortHandle};
use log::debug;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;

/// Copy variables between two ports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortMapConfig {
    pub name: String,
    pub src: String,
    pub dst: String,
    /// `(destination variable, source variable)` pairs
    #[serde(default)]
    pub vars: Vec<(String, String)>,
}

/// Run a sequence of named events as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub events: Vec<String>,
}

/// Fire a named event every `interval`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntryConfig {
    pub event: String,
    pub interval: Time,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouplingConfig {
    #[serde(default, rename = "map")]
    pub maps: Vec<PortMapConfig>,
    #[serde(default, rename = "chain")]
    pub chains: Vec<ChainConfig>,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntryConfig>,
}

/// Ports available to a configuration, addressed by name.
#[derive(Debug, Default)]
pub struct PortCatalog {
    ports: Vec<PortHandle>,
}

impl PortCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a port to the catalog.
    ///
    /// Fails if a port with the same name was already added.
    pub fn with_port(mut self, port: PortHandle) -> CMTResult<Self> {
        self.add_port(port)?;
        Ok(self)
    }

    pub fn add_port(&mut self, port: PortHandle) -> CMTResult<()> {
        let name = port_name(&port);
        if self.get(&name).is_some() {
            return Err(CMTError::Config(format!("port '{}' added twice", name)));
        }
        self.ports.push(port);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PortHandle> {
        self.ports.iter().find(|p| p.borrow().name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortHandle> {
        self.ports.iter()
    }

    fn require(&self, name: &str, context: &str) -> CMTResult<PortHandle> {
        self.get(name).cloned().ok_or_else(|| {
            CMTError::Config(format!("{} refers to unknown port '{}'", context, name))
        })
    }
}

/// Events created while building a configuration, addressed by name.
#[derive(Default)]
struct EventCatalog {
    events: HashMap<String, EventHandle>,
}

impl EventCatalog {
    fn insert(&mut self, name: &str, event: EventHandle) -> CMTResult<()> {
        if self.events.contains_key(name) {
            return Err(CMTError::Config(format!(
                "more than one event is named '{}'",
                name
            )));
        }
        self.events.insert(name.to_string(), event);
        Ok(())
    }

    fn require(&self, name: &str, context: &str) -> CMTResult<EventHandle> {
        self.events.get(name).cloned().ok_or_else(|| {
            CMTError::Config(format!("{} refers to unknown event '{}'", context, name))
        })
    }
}

impl CouplingConfig {
    pub fn from_toml(content: &str) -> CMTResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Order in which chains must be built so that nested chains exist before the chains
    /// that contain them.
    ///
    /// Fails if a chain contains itself, directly or through other chains.
    fn chain_build_order(&self) -> CMTResult<Vec<&ChainConfig>> {
        let mut graph = DiGraph::<&ChainConfig, ()>::new();
        let nodes: HashMap<&str, NodeIndex> = self
            .chains
            .iter()
            .map(|chain| (chain.name.as_str(), graph.add_node(chain)))
            .collect();

        for chain in self.chains.iter() {
            for member in chain.events.iter() {
                if let Some(&member_node) = nodes.get(member.as_str()) {
                    // Members are built before the chain holding them
                    graph.add_edge(member_node, nodes[chain.name.as_str()], ());
                }
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            CMTError::Config(format!(
                "chain '{}' contains itself",
                graph[cycle.node_id()].name
            ))
        })?;
        Ok(order.into_iter().map(|node| graph[node]).collect())
    }

    /// Create the events described by the configuration and schedule them.
    pub fn build(&self, ports: &PortCatalog) -> CMTResult<EventManager> {
        let mut events = EventCatalog::default();

        for port in ports.iter() {
            events.insert(&port_name(port), Rc::new(PortEvent::new(port.clone())))?;
        }

        for map in self.maps.iter() {
            let context = format!("map '{}'", map.name);
            let event = PortMapEvent::new(
                ports.require(&map.src, &context)?,
                ports.require(&map.dst, &context)?,
                map.vars.clone(),
            )
            .with_name(&map.name);
            events.insert(&map.name, Rc::new(event))?;
        }

        for chain in self.chain_build_order()? {
            let context = format!("chain '{}'", chain.name);
            let members = chain
                .events
                .iter()
                .map(|name| events.require(name, &context))
                .collect::<CMTResult<Vec<_>>>()?;
            events.insert(
                &chain.name,
                Rc::new(ChainEvent::new(members).with_name(&chain.name)),
            )?;
        }

        let schedule = self
            .schedule
            .iter()
            .map(|entry| {
                let event = events.require(&entry.event, "schedule")?;
                debug!("Scheduling '{}' every {}", entry.event, entry.interval);
                Ok((event, entry.interval))
            })
            .collect::<CMTResult<Vec<_>>>()?;

        EventManager::new(schedule)
    }
}
