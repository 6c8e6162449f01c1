//! # Resources
//! Peripheral groups handed to the tasks in main.rs, and the interrupt bindings.
use embassy_rp::i2c::InterruptHandler as I2cInterruptHandler;
use embassy_rp::peripherals::{
    DMA_CH0, DMA_CH1, FLASH, I2C0, PIN_4, PIN_5, PIN_8, PIN_12, PIN_13, PIN_18, PIN_19, PIN_20,
    PIN_21, PIN_22, SPI0, UART1,
};
use embassy_rp::uart::BufferedInterruptHandler;
use embassy_rp::{Peri, bind_interrupts};

// bind the interrupts, on a global scope
bind_interrupts!(pub struct Irqs {
    I2C0_IRQ => I2cInterruptHandler<I2C0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

/// The three buttons, active low
pub struct ButtonResources {
    /// Green button
    pub green: Peri<'static, PIN_20>,
    /// Blue button
    pub blue: Peri<'static, PIN_21>,
    /// Yellow button
    pub yellow: Peri<'static, PIN_22>,
}

/// The neopixel ring, driven over SPI
pub struct NeopixelResources {
    /// SPI block
    pub spi: Peri<'static, SPI0>,
    /// Clock pin, unused by the ring
    pub clk_pin: Peri<'static, PIN_18>,
    /// Data pin
    pub mosi_pin: Peri<'static, PIN_19>,
    /// DMA channel feeding the SPI
    pub tx_dma_ch: Peri<'static, DMA_CH1>,
}

/// The SSD1306 OLED display
pub struct DisplayResources {
    /// I2C block
    pub i2c0: Peri<'static, I2C0>,
    /// Clock line
    pub scl: Peri<'static, PIN_13>,
    /// Data line
    pub sda: Peri<'static, PIN_12>,
}

/// The DFPlayer Mini sound module
pub struct DfPlayerResources {
    /// UART block
    pub uart: Peri<'static, UART1>,
    /// Transmit pin
    pub tx_pin: Peri<'static, PIN_4>,
    /// Receive pin
    pub rx_pin: Peri<'static, PIN_5>,
    /// Gate of the MOSFET powering the module, it draws too much current when idle
    pub power_pin: Peri<'static, PIN_8>,
}

/// The onboard flash holding the settings
pub struct FlashResources {
    /// Flash block
    pub flash: Peri<'static, FLASH>,
    /// DMA channel for async reads
    pub dma_ch: Peri<'static, DMA_CH0>,
}
