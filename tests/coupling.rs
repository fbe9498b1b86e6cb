//! End-to-end coupling of sample components.

use cmt::components::{ClockComponent, ClockParameters, RelaxationComponent, RelaxationParameters};
use cmt::config::{CouplingConfig, PortCatalog};
use cmt::errors::CMTError;
use cmt::events::{ChainEvent, EventHandle, EventManager, PortEvent, PortMapEvent};
use cmt::port::{shared, PortHandle};
use cmt::{FloatValue, Grid};
use is_close::is_close;
use ndarray::ArrayD;
use std::rc::Rc;

const AIR_DENSITY: &str = "air__density";
const EARTH_TEMPERATURE: &str = "earth_surface__temperature";

fn air_and_earth() -> (PortHandle, PortHandle) {
    (
        shared(ClockComponent::scalar("air_port", AIR_DENSITY)),
        shared(ClockComponent::scalar("earth_port", EARTH_TEMPERATURE)),
    )
}

fn value(port: &PortHandle, name: &str) -> ArrayD<FloatValue> {
    port.borrow().get_grid_values(name).unwrap()
}

fn scalar(value: FloatValue) -> ArrayD<FloatValue> {
    Grid::scalar().filled(value)
}

#[test]
fn one_event() {
    let (air, earth) = air_and_earth();
    air.borrow_mut().initialize().unwrap();
    earth.borrow_mut().initialize().unwrap();

    let map: EventHandle = Rc::new(PortMapEvent::from_pairs(
        air.clone(),
        earth.clone(),
        &[(EARTH_TEMPERATURE, AIR_DENSITY)],
    ));
    let mut manager = EventManager::new(vec![(map, 1.0)]).unwrap();

    manager
        .with_scope(|_| {
            assert_eq!(value(&air, AIR_DENSITY), scalar(0.0));
            assert_eq!(value(&earth, EARTH_TEMPERATURE), scalar(0.0));
            Ok(())
        })
        .unwrap();
}

#[test]
fn chain() {
    let (air, earth) = air_and_earth();

    let air_step: EventHandle = Rc::new(ChainEvent::new(vec![
        Rc::new(PortEvent::new(air.clone())) as EventHandle,
        Rc::new(PortMapEvent::from_pairs(
            earth.clone(),
            air.clone(),
            &[(AIR_DENSITY, EARTH_TEMPERATURE)],
        )) as EventHandle,
    ]));
    let earth_step: EventHandle = Rc::new(PortEvent::new(earth.clone()));

    let mut manager = EventManager::new(vec![(air_step, 1.0), (earth_step, 1.2)]).unwrap();
    let mut scope = manager.enter().unwrap();
    assert_eq!(value(&earth, EARTH_TEMPERATURE), scalar(0.0));
    assert_eq!(value(&air, AIR_DENSITY), scalar(0.0));

    // The air is stepped, then reads an earth that hasn't moved yet
    scope.run(1.0).unwrap();
    assert_eq!(value(&earth, EARTH_TEMPERATURE), scalar(0.0));
    assert_eq!(value(&air, AIR_DENSITY), scalar(0.0));

    // The earth steps to 1.2 before the air's second firing reads it
    scope.run(2.0).unwrap();
    assert_eq!(value(&air, AIR_DENSITY), scalar(1.2));
    assert_eq!(earth.borrow().current_time(), 1.2);
    assert_eq!(air.borrow().current_time(), 2.0);

    scope.close().unwrap();
}

#[test]
fn chain_from_configuration() {
    let (air, earth) = air_and_earth();
    let ports = PortCatalog::new()
        .with_port(air.clone())
        .unwrap()
        .with_port(earth.clone())
        .unwrap();
    let config = CouplingConfig::from_toml(
        r#"
[[map]]
name = "earth_to_air"
src = "earth_port"
dst = "air_port"
vars = [["air__density", "earth_surface__temperature"]]

[[chain]]
name = "air_step"
events = ["air_port", "earth_to_air"]

[[schedule]]
event = "air_step"
interval = 1.0

[[schedule]]
event = "earth_port"
interval = 1.2
"#,
    )
    .unwrap();

    let mut manager = config.build(&ports).unwrap();
    manager
        .with_scope(|m| {
            m.run(1.0)?;
            assert_eq!(value(&air, AIR_DENSITY), scalar(0.0));
            m.run(2.0)
        })
        .unwrap();
    assert_eq!(value(&air, AIR_DENSITY), scalar(1.2));
}

#[test]
fn relaxation_driven_by_mapped_air_temperature() {
    let grid = Grid::new(&[2]);
    let air = shared(ClockComponent::from_parameters(
        "atmosphere",
        ClockParameters {
            grid: grid.clone(),
            outputs: vec![],
            inputs: vec!["air__temperature".to_string()],
            start_time: 0.0,
        },
    ));
    air.borrow_mut()
        .set_grid_values("air__temperature", grid.filled(290.0))
        .unwrap();
    let land = shared(RelaxationComponent::from_parameters(
        "land",
        grid,
        RelaxationParameters {
            tau: 2.0,
            initial_temperature: 280.0,
        },
    ));

    let land_step: EventHandle = Rc::new(ChainEvent::new(vec![
        Rc::new(PortMapEvent::from_pairs(
            air.clone(),
            land.clone(),
            &[(
                RelaxationComponent::air_temperature_name(),
                "air__temperature",
            )],
        )) as EventHandle,
        Rc::new(PortEvent::new(land.clone())) as EventHandle,
    ]));
    let mut manager = EventManager::new(vec![(land_step, 0.5)]).unwrap();
    manager.with_scope(|m| m.run(4.0)).unwrap();

    let expected = 290.0 - 10.0 * (-2.0f64).exp();
    let surface = value(&land, RelaxationComponent::surface_temperature_name());
    assert_eq!(surface.len(), 2);
    for v in surface.iter() {
        assert!(is_close!(*v, expected), "{} != {}", v, expected);
    }
    assert_eq!(land.borrow().current_time(), 4.0);
}

#[test]
fn failed_map_still_finalizes_components() {
    let (air, earth) = air_and_earth();
    let broken: EventHandle = Rc::new(ChainEvent::new(vec![
        Rc::new(PortEvent::new(air.clone())) as EventHandle,
        Rc::new(PortMapEvent::from_pairs(
            earth.clone(),
            air.clone(),
            &[(AIR_DENSITY, "earth__wind")],
        )) as EventHandle,
    ]));
    let earth_step: EventHandle = Rc::new(PortEvent::new(earth.clone()));
    let mut manager = EventManager::new(vec![(broken, 1.0), (earth_step, 1.0)]).unwrap();

    match manager.with_scope(|m| m.run(3.0)) {
        Err(CMTError::UnknownVariable { port, variable }) => {
            assert_eq!(port, "earth_port");
            assert_eq!(variable, "earth__wind");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    // The air stepped before the map failed, the earth never did
    assert_eq!(air.borrow().current_time(), 1.0);
    assert_eq!(earth.borrow().current_time(), 0.0);

    // Both components were finalized, so neither can be finalized again
    assert!(air.borrow_mut().finalize().is_err());
    assert!(earth.borrow_mut().finalize().is_err());
}
