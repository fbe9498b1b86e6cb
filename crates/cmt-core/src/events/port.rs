use crate::errors::CMTResult;
use crate::events::Event;
use crate::grid::Time;
use crate::port::{port_name, PortHandle};
use log::debug;

/// Steps a single component.
///
/// This is a transparent adapter: every lifecycle call is forwarded to the port and any
/// failure is returned as is.
#[derive(Debug)]
pub struct PortEvent {
    name: String,
    port: PortHandle,
}

impl PortEvent {
    pub fn new(port: PortHandle) -> Self {
        Self {
            name: port_name(&port),
            port,
        }
    }

    pub fn port(&self) -> &PortHandle {
        &self.port
    }
}

impl Event for PortEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self) -> CMTResult<()> {
        self.port.borrow_mut().initialize()
    }

    fn run(&self, until: Time) -> CMTResult<()> {
        self.port.borrow_mut().update_until(until)
    }

    fn finalize(&self) -> CMTResult<()> {
        self.port.borrow_mut().finalize()
    }
}

/// Copies variables from a source port to a destination port when fired.
///
/// Each entry of `vars_to_map` is a `(destination variable, source variable)` pair and pairs
/// are copied in order.
/// An empty list is allowed and makes the event a no-op.
///
/// The event does not take part in the lifecycle of either port.
/// Initializing and finalizing the ports is left to the [`PortEvent`]s that step them, as
/// the same port is typically shared with one.
#[derive(Debug)]
pub struct PortMapEvent {
    name: String,
    src: PortHandle,
    dst: PortHandle,
    vars_to_map: Vec<(String, String)>,
}

impl PortMapEvent {
    pub fn new(src: PortHandle, dst: PortHandle, vars_to_map: Vec<(String, String)>) -> Self {
        let name = format!("{}->{}", port_name(&src), port_name(&dst));
        Self {
            name,
            src,
            dst,
            vars_to_map,
        }
    }

    /// Build from borrowed `(destination, source)` name pairs
    pub fn from_pairs(src: PortHandle, dst: PortHandle, vars_to_map: &[(&str, &str)]) -> Self {
        let vars_to_map = vars_to_map
            .iter()
            .map(|(dst_name, src_name)| (dst_name.to_string(), src_name.to_string()))
            .collect();
        Self::new(src, dst, vars_to_map)
    }

    /// Replace the default `src->dst` name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn src(&self) -> &PortHandle {
        &self.src
    }

    pub fn dst(&self) -> &PortHandle {
        &self.dst
    }

    pub fn vars_to_map(&self) -> &[(String, String)] {
        &self.vars_to_map
    }
}

impl Event for PortMapEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self) -> CMTResult<()> {
        Ok(())
    }

    fn run(&self, until: Time) -> CMTResult<()> {
        for (dst_name, src_name) in self.vars_to_map.iter() {
            // The source borrow ends before the destination is borrowed so that a port may be
            // mapped onto itself.
            let values = self.src.borrow().get_grid_values(src_name)?;
            debug!(
                "{}: mapping '{}' to '{}' at t={}",
                self.name, src_name, dst_name, until
            );
            self.dst.borrow_mut().set_grid_values(dst_name, values)?;
        }
        Ok(())
    }

    fn finalize(&self) -> CMTResult<()> {
        Ok(())
    }
}
