//! Process-image layout of DIO and AIO modules.
//!
//! Pure address arithmetic: given a module's input/output offsets, classify
//! a variable address and derive the companion addresses (PWM flag, duty
//! cycle, counter mode, analog range selector) that pin operations touch.
//!
//! DIO map relative to `input_offset` (`in`) and `output_offset` (`out`):
//!
//! ```text
//! in+0   .. in+1     digital input word
//! in+6   .. out-1    input counters, 4 bytes each
//! out+0  .. out+1    digital output word
//! out+2  .. in+87    PWM duty cycles, 1 byte each
//! in+88  .. in+103   input mode per channel
//! in+110 .. in+111   PWM active bits
//! in+112             PWM frequency step
//! ```

use revpi_common::picontrol::consts::{
    ANALOG_INPUT_CONFIG_STRIDE, ANALOG_INPUT_RANGE_OFFSET, ANALOG_INPUT_SPAN,
    ANALOG_OUTPUT_1_RANGE_OFFSET, ANALOG_OUTPUT_2_OFFSET, ANALOG_OUTPUT_2_RANGE_OFFSET,
    COUNTER_CELL_BYTES, DIO_MEMORY_OFFSET, INPUT_MODE_OFFSET, INPUT_WORD_TO_COUNTER_OFFSET,
    OUTPUT_PWM_ACTIVE_OFFSET, OUTPUT_PWM_FREQUENCY_OFFSET, OUTPUT_WORD_TO_PWM_OFFSET,
};
use revpi_common::picontrol::types::DeviceRecord;

/// Role of an address inside a DIO module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DioAddress {
    /// One of the two output-word bytes.
    OutputWord,
    /// One PWM duty-cycle byte.
    PwmChannel,
    /// One of the two input-word bytes.
    InputWord,
    /// Inside the counter block.
    InputCounter,
    /// Status, config or anything else.
    Unclassified,
}

impl DioAddress {
    /// Output word or PWM channel.
    pub fn is_output(self) -> bool {
        matches!(self, Self::OutputWord | Self::PwmChannel)
    }
}

/// Role of an address inside an AIO module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AioAddress {
    /// One of the analog input values.
    Input,
    /// Analog output 1 or 2.
    Output,
    /// Anything else.
    Unclassified,
}

/// Counter cell and its mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterCell {
    /// Index into the input mode table.
    pub mode_index: u16,
    /// First byte of the 4-byte counter value.
    pub counter_address: u16,
}

/// Input and output offsets of one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceOffsets {
    /// First input byte.
    pub input_offset: u16,
    /// First output byte.
    pub output_offset: u16,
}

impl From<&DeviceRecord> for DeviceOffsets {
    fn from(dev: &DeviceRecord) -> Self {
        Self {
            input_offset: dev.input_offset,
            output_offset: dev.output_offset,
        }
    }
}

fn narrow(addr: u32) -> u16 {
    addr as u16
}

impl DeviceOffsets {
    fn input(&self) -> u32 {
        u32::from(self.input_offset)
    }

    fn output(&self) -> u32 {
        u32::from(self.output_offset)
    }

    // ─── DIO ────────────────────────────────────────────────────────────

    /// Classify `address` within a DIO module.
    ///
    /// Checked in order output word, PWM channel, input word, counter; the
    /// first match wins.
    pub fn classify_dio(&self, address: u16) -> DioAddress {
        let a = u32::from(address);
        let (inp, out) = (self.input(), self.output());
        if a == out || a == out + 1 {
            DioAddress::OutputWord
        } else if a >= out + u32::from(OUTPUT_WORD_TO_PWM_OFFSET)
            && a < inp + u32::from(DIO_MEMORY_OFFSET)
        {
            DioAddress::PwmChannel
        } else if a == inp || a == inp + 1 {
            DioAddress::InputWord
        } else if a >= inp + u32::from(INPUT_WORD_TO_COUNTER_OFFSET) && a < out {
            DioAddress::InputCounter
        } else {
            DioAddress::Unclassified
        }
    }

    /// Byte and bit of the PWM-active flag for an output-class address.
    pub fn pwm_active_flag(&self, address: u16, bit_position: u8, class: DioAddress) -> (u16, u8) {
        let base = self.input() + u32::from(OUTPUT_PWM_ACTIVE_OFFSET);
        let rel = u32::from(address).saturating_sub(self.output());
        match class {
            DioAddress::PwmChannel => {
                let pwm_bit = rel.saturating_sub(u32::from(OUTPUT_WORD_TO_PWM_OFFSET));
                (narrow(base + pwm_bit / 8), (pwm_bit % 8) as u8)
            }
            _ => (narrow(base + rel), bit_position),
        }
    }

    /// Byte and bit a digital `set`/`get` touches.
    ///
    /// PWM channels map back onto the output word, counter cells onto the
    /// input word; everything else uses the variable's own address and bit.
    pub fn gpio_bit(&self, address: u16, bit_position: u8, class: DioAddress) -> (u16, u8) {
        let a = u32::from(address);
        match class {
            DioAddress::PwmChannel => {
                let rel = a
                    .saturating_sub(self.output())
                    .saturating_sub(u32::from(OUTPUT_WORD_TO_PWM_OFFSET));
                (narrow(self.output() + (rel >> 3)), (rel % 8) as u8)
            }
            DioAddress::InputCounter => {
                let rel = a
                    .saturating_sub(self.input())
                    .saturating_sub(u32::from(INPUT_WORD_TO_COUNTER_OFFSET));
                (narrow(self.input() + (rel >> 5)), ((rel / 4) % 8) as u8)
            }
            _ => (address, bit_position),
        }
    }

    /// Address of the duty-cycle byte for an output-class address.
    pub fn pwm_duty_address(&self, address: u16, bit_position: u8, class: DioAddress) -> u16 {
        match class {
            DioAddress::PwmChannel => address,
            _ => {
                let a = u32::from(address);
                let rel = a.saturating_sub(self.output());
                narrow(
                    a + u32::from(OUTPUT_WORD_TO_PWM_OFFSET) + 7 * rel + u32::from(bit_position),
                )
            }
        }
    }

    /// Address of the PWM frequency step byte.
    pub fn pwm_frequency_address(&self) -> u16 {
        narrow(self.input() + u32::from(OUTPUT_PWM_FREQUENCY_OFFSET))
    }

    /// Counter cell behind a counter-channel or input-word address.
    pub fn counter_cell(&self, address: u16, bit_position: u8, class: DioAddress) -> Option<CounterCell> {
        let a = u32::from(address);
        let counter_base = self.input() + u32::from(INPUT_WORD_TO_COUNTER_OFFSET);
        match class {
            DioAddress::InputCounter => Some(CounterCell {
                mode_index: narrow(a.saturating_sub(counter_base) >> 2),
                counter_address: address,
            }),
            DioAddress::InputWord => {
                let mode_index = (a.saturating_sub(self.input()) << 3) + u32::from(bit_position);
                Some(CounterCell {
                    mode_index: narrow(mode_index),
                    counter_address: narrow(
                        counter_base + mode_index * u32::from(COUNTER_CELL_BYTES),
                    ),
                })
            }
            _ => None,
        }
    }

    /// Address of input mode byte `mode_index`.
    pub fn input_mode_address(&self, mode_index: u16) -> u16 {
        narrow(self.input() + u32::from(INPUT_MODE_OFFSET) + u32::from(mode_index))
    }

    // ─── AIO ────────────────────────────────────────────────────────────

    /// Classify `address` within an AIO module.
    pub fn classify_aio(&self, address: u16) -> AioAddress {
        let a = u32::from(address);
        let (inp, out) = (self.input(), self.output());
        if a >= inp && a < inp + u32::from(ANALOG_INPUT_SPAN) {
            AioAddress::Input
        } else if a == out || a == out + u32::from(ANALOG_OUTPUT_2_OFFSET) {
            AioAddress::Output
        } else {
            AioAddress::Unclassified
        }
    }

    /// Range selector address of an analog input.
    pub fn analog_input_range_address(&self, address: u16) -> u16 {
        let rel = u32::from(address).saturating_sub(self.input());
        narrow(
            self.input()
                + u32::from(ANALOG_INPUT_RANGE_OFFSET)
                + u32::from(ANALOG_INPUT_CONFIG_STRIDE) * (rel / 2),
        )
    }

    /// Range selector address of an analog output.
    pub fn analog_output_range_address(&self, address: u16) -> u16 {
        let offset = if u32::from(address) == self.output() + u32::from(ANALOG_OUTPUT_2_OFFSET) {
            ANALOG_OUTPUT_2_RANGE_OFFSET
        } else {
            ANALOG_OUTPUT_1_RANGE_OFFSET
        };
        narrow(self.input() + u32::from(offset))
    }
}

/// Hz for a PWM frequency step byte; unknown steps read as 0.
pub fn pwm_step_to_hz(step: u8) -> u32 {
    match step {
        1 => 40,
        2 => 80,
        4 => 160,
        5 => 200,
        10 => 400,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIO: DeviceOffsets = DeviceOffsets {
        input_offset: 0,
        output_offset: 70,
    };

    #[test]
    fn test_classify_dio_stock_layout() {
        assert_eq!(DIO.classify_dio(0), DioAddress::InputWord);
        assert_eq!(DIO.classify_dio(1), DioAddress::InputWord);
        assert_eq!(DIO.classify_dio(2), DioAddress::Unclassified);
        assert_eq!(DIO.classify_dio(6), DioAddress::InputCounter);
        assert_eq!(DIO.classify_dio(69), DioAddress::InputCounter);
        assert_eq!(DIO.classify_dio(70), DioAddress::OutputWord);
        assert_eq!(DIO.classify_dio(71), DioAddress::OutputWord);
        assert_eq!(DIO.classify_dio(72), DioAddress::PwmChannel);
        assert_eq!(DIO.classify_dio(87), DioAddress::PwmChannel);
        assert_eq!(DIO.classify_dio(88), DioAddress::Unclassified);
    }

    #[test]
    fn test_pwm_channel_maps_onto_output_word() {
        // Channel 9 is bit 1 of the second output byte.
        let class = DIO.classify_dio(72 + 9);
        assert_eq!(DIO.gpio_bit(81, 0, class), (71, 1));
        assert_eq!(DIO.pwm_active_flag(81, 0, class), (111, 1));
        assert_eq!(DIO.pwm_duty_address(81, 0, class), 81);
    }

    #[test]
    fn test_output_word_duty_address() {
        let class = DioAddress::OutputWord;
        assert_eq!(DIO.pwm_duty_address(70, 3, class), 75);
        assert_eq!(DIO.pwm_duty_address(71, 0, class), 80);
        assert_eq!(DIO.pwm_active_flag(71, 4, class), (111, 4));
    }

    #[test]
    fn test_counter_cells() {
        let cell = DIO.counter_cell(14, 0, DioAddress::InputCounter).unwrap();
        assert_eq!(cell, CounterCell { mode_index: 2, counter_address: 14 });
        assert_eq!(DIO.input_mode_address(cell.mode_index), 90);

        let cell = DIO.counter_cell(1, 2, DioAddress::InputWord).unwrap();
        assert_eq!(cell, CounterCell { mode_index: 10, counter_address: 46 });

        assert!(DIO.counter_cell(70, 0, DioAddress::OutputWord).is_none());
        assert_eq!(DIO.gpio_bit(46, 0, DioAddress::InputCounter), (1, 2));
    }

    #[test]
    fn test_aio_layout() {
        let aio = DeviceOffsets {
            input_offset: 0,
            output_offset: 20,
        };
        assert_eq!(aio.classify_aio(0), AioAddress::Input);
        assert_eq!(aio.classify_aio(7), AioAddress::Input);
        assert_eq!(aio.classify_aio(8), AioAddress::Unclassified);
        assert_eq!(aio.classify_aio(20), AioAddress::Output);
        assert_eq!(aio.classify_aio(21), AioAddress::Unclassified);
        assert_eq!(aio.classify_aio(22), AioAddress::Output);

        assert_eq!(aio.analog_input_range_address(0), 24);
        assert_eq!(aio.analog_input_range_address(6), 45);
        assert_eq!(aio.analog_output_range_address(20), 69);
        assert_eq!(aio.analog_output_range_address(22), 79);
    }

    #[test]
    fn test_pwm_step_table() {
        let known = [(1, 40), (2, 80), (4, 160), (5, 200), (10, 400)];
        for (step, hz) in known {
            assert_eq!(pwm_step_to_hz(step), hz);
        }
        for step in [0u8, 3, 6, 7, 8, 9, 11, 255] {
            assert_eq!(pwm_step_to_hz(step), 0);
        }
    }
}
