#![no_main]
#![no_std]
use panic_halt as _;
use rtic::app;
use shared_types::TraceLog;
use stm32f1xx_hal::prelude::*;

use ps2_paddles::{
    clear_update, sample_timer, trace_log, KeyLeds, Port, Ps2Receiver, SAMPLE_RATE_HZ,
};

#[app(device = stm32f1xx_hal::pac, peripherals = true)]
mod app {
    use super::*;
    use embedded_hal::digital::v2::InputPin;
    use stm32f1xx_hal::gpio::{gpiob::PB0, Input, PullUp};
    use stm32f1xx_hal::pac::TIM2;

    #[resources]
    struct Resources {
        receiver: Ps2Receiver,
        leds: KeyLeds,
        /// Push button to ground; held down, the receiver stays in reset
        reset_button: PB0<Input<PullUp>>,
        tim2: TIM2,
        log: &'static mut TraceLog,
    }

    #[init]
    fn init(c: init::Context) -> (init::LateResources, init::Monotonics) {
        let mut flash = c.device.FLASH.constrain();
        let mut rcc = c.device.RCC.constrain();

        let clocks = rcc
            .cfgr
            .use_hse(8_u32.mhz())
            .sysclk(72_u32.mhz())
            .pclk1(36_u32.mhz())
            .freeze(&mut flash.acr);

        let mut gpioa = c.device.GPIOA.split(&mut rcc.apb2);
        let mut gpiob = c.device.GPIOB.split(&mut rcc.apb2);

        let port = Port {
            clock: gpiob.pb6.into_pull_up_input(&mut gpiob.crl),
            data: gpiob.pb7.into_pull_up_input(&mut gpiob.crl),
        };
        let reset_button = gpiob.pb0.into_pull_up_input(&mut gpiob.crl);
        let mut leds = KeyLeds(
            gpioa.pa4.into_push_pull_output(&mut gpioa.crl),
            gpioa.pa5.into_push_pull_output(&mut gpioa.crl),
            gpioa.pa6.into_push_pull_output(&mut gpioa.crl),
            gpioa.pa7.into_push_pull_output(&mut gpioa.crl),
        );
        let receiver = port.receiver();
        leds.show(&receiver.keys());

        let tim2 = sample_timer(
            SAMPLE_RATE_HZ.hz(),
            c.device.TIM2,
            &mut rcc.apb1,
            &clocks,
        );

        let log = trace_log();

        (
            init::LateResources {
                receiver,
                leds,
                reset_button,
                tim2,
                log,
            },
            init::Monotonics(),
        )
    }

    #[task(binds = TIM2, priority = 2, resources = [receiver, leds, reset_button, tim2])]
    fn sample(mut c: sample::Context) {
        let sample::Resources {
            ref mut receiver,
            ref mut leds,
            ref mut reset_button,
            ref mut tim2,
        } = c.resources;
        tim2.lock(|tim2| clear_update(tim2));
        let reset = reset_button.lock(|button| matches!(button.is_low(), Ok(true)));
        (receiver, leds).lock(|receiver, leds| match receiver.poll(reset) {
            Ok(keys) => leds.show(&keys),
            // the pins are infallible
            Err(e) => match e {},
        });
    }

    /// Move events from the receiver into the trace log while there is
    /// nothing else to do. The log's count of lost events follows the
    /// receiver's.
    #[idle(resources = [receiver, log])]
    fn idle(mut c: idle::Context) -> ! {
        loop {
            let (next, dropped) = c
                .resources
                .receiver
                .lock(|receiver| (receiver.pop_event(), receiver.dropped()));
            c.resources.log.lock(|log| log.set_dropped(dropped));
            match next {
                Some(record) => {
                    let event = record.event.trace();
                    c.resources
                        .log
                        .lock(|log| log.record(record.tick, event))
                        .ok();
                }
                None => cortex_m::asm::wfi(),
            }
        }
    }
}
