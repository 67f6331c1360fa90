//! End-to-end scenarios against the simulated control channel.
//!
//! Each test builds a `SimulatedControl` with a small device table and
//! variable table, hands it to a `Chip` or a component, and checks both the
//! returned values and the commands that reached the channel.

use std::sync::Arc;

use revpi_common::capability::{Analog, Board, Component, DigitalInterrupt, Encoder, Gpio};
use revpi_common::capability::PositionType;
use revpi_common::config::{ComponentConfig, ENCODER_MODEL, EncoderConfig};
use revpi_common::error::{DeviceAnomaly, PiError};
use revpi_common::picontrol::consts::{MODULE_TYPE_AIO, MODULE_TYPE_DIO};
use revpi_common::picontrol::types::{DeviceInfo, SpiValue};
use revpi_hal::channel::simulated::{aio_module, dio_module};
use revpi_hal::layout::{DeviceOffsets, DioAddress};
use revpi_hal::{Chip, ComponentRegistry, SimulatedControl};

fn chip_on(sim: &Arc<SimulatedControl>) -> Chip {
    Chip::new(Box::new(Arc::clone(sim))).expect("enumerate")
}

/// Scenario A: compact DIO, output word right after the input word.
#[test]
fn scenario_a_digital_output_word() {
    let dio = DeviceInfo {
        module_type: MODULE_TYPE_DIO,
        input_offset: 0,
        output_offset: 2,
        input_length: 2,
        output_length: 18,
        config_length: 100,
        active: 1,
        ..DeviceInfo::default()
    };
    let sim = Arc::new(
        SimulatedControl::default()
            .with_device(dio)
            .with_variable("O_1", 2, 0, 1),
    );
    let chip = chip_on(&sim);

    let offsets = DeviceOffsets {
        input_offset: 0,
        output_offset: 2,
    };
    assert_eq!(offsets.classify_dio(2), DioAddress::OutputWord);

    let pin = chip.gpio_pin("O_1").unwrap();
    assert_eq!(pin.class(), DioAddress::OutputWord);
    assert!(!pin.is_pwm());

    pin.set(true).unwrap();
    assert_eq!(
        sim.bit_writes(),
        vec![SpiValue {
            address: 2,
            bit: 0,
            value: 1
        }]
    );
    assert!(pin.get().unwrap());
}

/// Scenario B: AIO output 1 with range code 2 (0..10000 mV).
#[test]
fn scenario_b_analog_output_range() {
    let aio = DeviceInfo {
        module_type: MODULE_TYPE_AIO,
        input_offset: 0,
        output_offset: 8,
        input_length: 8,
        output_length: 4,
        config_length: 80,
        active: 1,
        ..DeviceInfo::default()
    };
    let sim = Arc::new(
        SimulatedControl::default()
            .with_device(aio)
            .with_variable("AnalogOutput_1", 8, 0, 16),
    );
    sim.poke(69, &[2]);
    let chip = chip_on(&sim);

    let pin = chip.analog_pin("AnalogOutput_1").unwrap();
    let range = pin.range();
    assert_eq!((range.min, range.max, range.is_current), (0, 10_000, false));

    assert!(matches!(
        pin.write(12_000),
        Err(PiError::OutOfRange { .. })
    ));
    assert_eq!(sim.peek(8, 4), vec![0, 0, 0, 0]);

    pin.write(5_000).unwrap();
    assert_eq!(sim.peek(8, 4), 5_000i32.to_le_bytes().to_vec());

    // An output pin cannot be sampled.
    assert!(matches!(pin.read(), Err(PiError::NotConfigured { .. })));
}

/// Scenario C: two active DIO modules and one unconfigured slot.
#[test]
fn scenario_c_partial_chassis() {
    let mut unconfigured = dio_module(33, 400);
    unconfigured.active = 0;

    let sim = Arc::new(
        SimulatedControl::default()
            .with_device(dio_module(31, 0))
            .with_device(dio_module(32, 200))
            .with_device(unconfigured)
            .with_variable("O_1", 270, 0, 1),
    );
    let mut chip = chip_on(&sim);

    let report = chip.refresh().unwrap().expect("anomaly report");
    assert_eq!(chip.directory().dio_devices().len(), 2);
    assert_eq!(report.0.len(), 1);
    assert!(matches!(report.0[0], DeviceAnomaly::NotConfigured { slot: 2, .. }));
    assert_eq!(
        report.to_string(),
        "device 2 is type RevPi DIO but is not configured"
    );

    // A present pin still works.
    let pin = chip.gpio_pin("O_1").unwrap();
    pin.set(true).unwrap();
    assert_eq!(sim.peek(270, 1), vec![1]);
}

/// Scenario D: encoder zeroing and relative position.
#[test]
fn scenario_d_encoder_position() {
    let sim = Arc::new(
        SimulatedControl::default()
            .with_device(dio_module(31, 0))
            .with_variable("Counter_3", 14, 0, 32),
    );
    sim.poke(88 + 2, &[3]);
    sim.poke(14, &1_000u32.to_le_bytes());
    let chip = chip_on(&sim);

    let mut encoder = chip.encoder("Counter_3").unwrap();
    encoder.reset_position().unwrap();
    assert_eq!(
        encoder.position(PositionType::Unspecified).unwrap(),
        (0.0, PositionType::Ticks)
    );

    sim.poke(14, &1_250u32.to_le_bytes());
    assert_eq!(
        encoder.position(PositionType::Ticks).unwrap(),
        (250.0, PositionType::Ticks)
    );
    assert!(matches!(
        encoder.position(PositionType::Degrees),
        Err(PiError::Unsupported(_))
    ));
}

#[test]
fn encoder_component_through_registry() {
    let sim = Arc::new(
        SimulatedControl::default()
            .with_device(dio_module(31, 0))
            .with_variable("Counter_1", 6, 0, 32),
    );
    sim.poke(88, &[3]);
    sim.poke(6, &0xFFFF_FFF0u32.to_le_bytes());

    let config = ComponentConfig {
        model: ENCODER_MODEL.to_string(),
        encoder: Some(EncoderConfig {
            pin: "Counter_1".to_string(),
        }),
        ..ComponentConfig::default()
    };
    let mut component = ComponentRegistry::with_builtin()
        .create(&config, Box::new(Arc::clone(&sim)))
        .unwrap();
    assert_eq!(component.model(), ENCODER_MODEL);

    let encoder = component.as_encoder_mut().expect("encoder view");
    encoder.reset_position().unwrap();
    let props = encoder.properties();
    assert!(props.ticks_count_supported);
    assert!(!props.angle_degrees_supported);

    // Counter wraps past zero.
    sim.poke(6, &0x10u32.to_le_bytes());
    let (pos, _) = encoder.position(PositionType::Ticks).unwrap();
    assert_eq!(pos, 32.0);

    component.close().unwrap();
    assert!(sim.is_closed());
}

#[test]
fn board_resolves_pins_by_class() {
    let sim = Arc::new(
        SimulatedControl::default()
            .with_device(dio_module(31, 0))
            .with_device(aio_module(32, 200))
            .with_variable("Counter_1", 6, 0, 32)
            .with_variable("InputValue_2", 202, 0, 16),
    );
    sim.poke(88, &[1]);
    sim.poke(6, &41u32.to_le_bytes());
    // Input 2 uses range code 5 (0..20 mA).
    sim.poke(200 + 24 + 7, &[5]);
    sim.poke(202, &12_345u16.to_le_bytes());

    let registry = ComponentRegistry::with_builtin();
    let component = registry
        .create(&ComponentConfig::default(), Box::new(Arc::clone(&sim)))
        .unwrap();
    let board = component.as_board().expect("board view");

    let counter = board.digital_interrupt_by_name("Counter_1").unwrap();
    assert_eq!(counter.name(), "Counter_1");
    assert_eq!(counter.value().unwrap(), 41);

    let analog = board.analog_by_name("InputValue_2").unwrap();
    let sample = analog.read().unwrap();
    assert_eq!(sample.value, 12_345);
    assert_eq!(sample.min, 0.0);
    assert_eq!(sample.max, 20_000.0);
    assert_eq!(sample.step_size, 0.001);

    assert!(matches!(
        board.gpio_pin_by_name("Missing"),
        Err(PiError::AddressResolution { .. })
    ));
}

#[test]
fn analog_output_switched_off() {
    let sim = Arc::new(
        SimulatedControl::default()
            .with_device(aio_module(32, 0))
            .with_variable("AnalogOutput_2", 22, 0, 16),
    );
    // Range byte of output 2 left at 0.
    let chip = chip_on(&sim);
    match chip.analog_pin("AnalogOutput_2") {
        Err(PiError::NotConfigured { pin, reason }) => {
            assert_eq!(pin, "AnalogOutput_2");
            assert_eq!(reason, "not configured for analog write");
        }
        other => panic!("unexpected {other:?}"),
    }

    sim.poke(79, &[12]);
    assert!(matches!(
        chip.analog_pin("AnalogOutput_2"),
        Err(PiError::InvalidRangeCode { code: 12, .. })
    ));
}

#[test]
fn sibling_bits_set_concurrently() {
    let sim = Arc::new(SimulatedControl::default().with_device(dio_module(31, 0)));
    for bit in 0..8u8 {
        sim.add_variable(&format!("O_{}", bit + 1), 70, bit, 1);
    }
    let chip = chip_on(&sim);

    std::thread::scope(|s| {
        for bit in 0..8u8 {
            let chip = &chip;
            s.spawn(move || {
                let pin = chip.gpio_pin(&format!("O_{}", bit + 1)).unwrap();
                pin.set(true).unwrap();
            });
        }
    });

    assert_eq!(sim.peek(70, 1), vec![0xFF]);
    assert_eq!(sim.bit_writes().len(), 8);
}
