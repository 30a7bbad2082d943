#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::cell::RefCell;

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use log::{error, info};
use static_cell::StaticCell;

// Display-LCD panel specific imports
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::spi::master::{Config, Spi};
use mipidsi::interface::SpiInterface;
use mipidsi::{Builder as MipidsiBuilder, models::ILI9342CRgb565};

use thermo_badge_core::events::post;
use thermo_badge_core::{Badge, BadgeEvent, EventChannel, Runtime};
use thermo_badge_firmware::build_config::badge_config;
use thermo_badge_firmware::hardware::buzzer::{self, BackgroundQueue, BuzzerPin};
use thermo_badge_firmware::hardware::radio;
use thermo_badge_firmware::hardware::{BuzzerAudio, EspNowLink, LcdDisplay, Sht40Sensor};

const DISPLAY_WIDTH: u16 = 320;
const DISPLAY_HEIGHT: u16 = 240;

/// Reading reported until the SHT40 answers for the first time
const FALLBACK_CELSIUS: i32 = 20;
const BUTTON_LOCKOUT: Duration = Duration::from_millis(30);

static EVENTS: EventChannel = EventChannel::new();
static BUZZER_PIN: BuzzerPin = Mutex::new(RefCell::new(None));
static BUZZER_QUEUE: BackgroundQueue = BackgroundQueue::new();
static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[embassy_executor::task(pool_size = 2)]
async fn button_task(mut button: Input<'static>, event: BadgeEvent) {
    loop {
        button.wait_for_falling_edge().await;
        post(&EVENTS, event);
        Timer::after(BUTTON_LOCKOUT).await;
    }
}

#[embassy_executor::task]
async fn radio_rx_task(receiver: esp_radio::esp_now::EspNowReceiver<'static>) {
    radio::run_receiver(receiver, &EVENTS).await
}

#[embassy_executor::task]
async fn buzzer_task(tempo_bpm: u16) {
    buzzer::run_background(&BUZZER_PIN, &BUZZER_QUEUE, tempo_bpm).await
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // ESP-NOW needs heap for its internal buffers
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let badge_config = badge_config();
    if let Err(e) = badge_config.validate() {
        error!("Invalid badge configuration: {}", e);
    }

    // Radio: ESP-NOW broadcast on top of the Wi-Fi controller
    let radio_init =
        RADIO.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (mut wifi_controller, interfaces) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");
    wifi_controller
        .set_mode(esp_radio::wifi::WifiMode::Sta)
        .expect("Failed to set Wi-Fi mode");
    wifi_controller.start().expect("Failed to start Wi-Fi");
    let (_manager, sender, receiver) = interfaces.esp_now.split();

    // Display
    let spi_bus = Spi::new(peripherals.SPI2, Config::default())
        .expect("Failed to configure SPI")
        .with_sck(peripherals.GPIO36)
        .with_mosi(peripherals.GPIO37);
    let cs = Output::new(peripherals.GPIO35, Level::High, OutputConfig::default());
    let spi_device =
        ExclusiveDevice::new_no_delay(spi_bus, cs).expect("Failed to create SPI device");
    let dc = Output::new(peripherals.GPIO34, Level::Low, OutputConfig::default());
    let mut spi_buffer = [0u8; 64];
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);
    let panel = MipidsiBuilder::new(ILI9342CRgb565, di)
        .display_size(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        .init(&mut embassy_time::Delay)
        .expect("Failed to initialize display");
    info!("Display initialized!");

    // Temperature sensor
    let i2c = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(400)),
    )
    .expect("Failed to configure I2C")
    .with_sda(peripherals.GPIO12)
    .with_scl(peripherals.GPIO11);

    // Buzzer and alert pin
    BUZZER_PIN.lock(|cell| {
        cell.replace(Some(Output::new(
            peripherals.GPIO9,
            Level::Low,
            OutputConfig::default(),
        )));
    });
    let alert_pin = Output::new(peripherals.GPIO10, Level::Low, OutputConfig::default());

    // Buttons, active low
    let button_config = InputConfig::default().with_pull(Pull::Up);
    let button_a = Input::new(peripherals.GPIO1, button_config);
    let button_b = Input::new(peripherals.GPIO2, button_config);

    spawner
        .spawn(button_task(button_a, BadgeEvent::ButtonA))
        .expect("Failed to spawn button A task");
    spawner
        .spawn(button_task(button_b, BadgeEvent::ButtonB))
        .expect("Failed to spawn button B task");
    spawner
        .spawn(radio_rx_task(receiver))
        .expect("Failed to spawn radio task");
    spawner
        .spawn(buzzer_task(badge_config.tempo_bpm))
        .expect("Failed to spawn buzzer task");

    let tempo_bpm = badge_config.tempo_bpm;
    let badge = Badge::new(
        Sht40Sensor::new(i2c, FALLBACK_CELSIUS),
        LcdDisplay::new(panel),
        BuzzerAudio::new(&BUZZER_PIN, &BUZZER_QUEUE, tempo_bpm),
        alert_pin,
        EspNowLink::new(sender),
        badge_config,
    );

    // Startup radio failures are logged by the runtime; the badge keeps going
    let mut runtime = Runtime::start(badge, &EVENTS, Instant::now());
    info!("Badge running");

    loop {
        let report = runtime.poll(Instant::now());
        if report.errors > 0 {
            error!("{} handler(s) failed this cycle", report.errors);
        }
        embassy_futures::yield_now().await;
    }
}
