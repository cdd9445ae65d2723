#![no_std]
use core::convert::Infallible;
use cortex_m::singleton;
use embedded_hal::digital::v2::OutputPin;
use ps2_decode::{drive_level, Config, KeyStates, Paddle, Receiver, PADDLES};
use shared_types::TraceLog;
use stm32f1xx_hal::gpio::{
    gpioa::{PA4, PA5, PA6, PA7},
    gpiob::{PB6, PB7},
    Input, Output, PullUp, PushPull,
};
use stm32f1xx_hal::pac;
use stm32f1xx_hal::rcc::{Clocks, Enable, GetBusFreq, Reset, APB1};
use stm32f1xx_hal::time::Hertz;

/// How often the PS/2 lines are sampled.
///
/// Keyboards clock at 10 to 16.7kHz, so the shortest clock half period is
/// 30µs. The line filter needs 3 samples of a level before it believes it,
/// and this leaves room for 6.
pub const SAMPLE_RATE_HZ: u32 = 200_000;

/// Ticks without a clock edge after which a partial frame is dropped. 2ms.
pub const RESYNC_TICKS: u32 = SAMPLE_RATE_HZ / 500;

/// Pipeline configuration used by the firmware.
pub const CONFIG: Config = Config::strict(RESYNC_TICKS);

/// The receiver, as wired on the board.
pub type Ps2Receiver = Receiver<PB6<Input<PullUp>>, PB7<Input<PullUp>>, 4>;

/// Compute the Auto Reload Register and Prescaller Register values for a timer
#[inline(always)]
fn compute_arr_presc(freq: u32, clock: u32) -> (u16, u16) {
    let ticks = clock / freq;
    let psc = ((ticks - 1) / (1 << 16)) as u16;
    // the counter runs from 0 to ARR inclusive
    let arr = (ticks / (psc + 1) as u32 - 1) as u16;
    (psc, arr)
}

/// The PS/2 socket.
///
/// Pin | Wiring
/// ----|------------------------------------------------
/// PB6 | Clock, pin 5 of the mini-DIN socket
/// PB7 | Data, pin 1 of the mini-DIN socket
///
/// Both lines are open collector and driven at 5V by the keyboard; PB6 and
/// PB7 are 5V tolerant. The keyboard has its own pull-ups, the internal
/// ones only keep the lines idle while it is unplugged.
pub struct Port {
    pub clock: PB6<Input<PullUp>>,
    pub data: PB7<Input<PullUp>>,
}

impl Port {
    pub fn receiver(self) -> Ps2Receiver {
        Receiver::new(self.clock, self.data, PADDLES, CONFIG)
    }
}

/// One LED per paddle key, lit while the key is held.
///
/// Pin | Key
/// ----|-----------------
/// PA4 | W, left_up
/// PA5 | S, left_down
/// PA6 | I, right_up
/// PA7 | K, right_down
pub struct KeyLeds(
    pub PA4<Output<PushPull>>,
    pub PA5<Output<PushPull>>,
    pub PA6<Output<PushPull>>,
    pub PA7<Output<PushPull>>,
);

impl KeyLeds {
    pub fn show(&mut self, keys: &KeyStates<4>) {
        light(&mut self.0, keys.paddle(Paddle::LeftUp));
        light(&mut self.1, keys.paddle(Paddle::LeftDown));
        light(&mut self.2, keys.paddle(Paddle::RightUp));
        light(&mut self.3, keys.paddle(Paddle::RightDown));
    }
}

fn light<P: OutputPin<Error = Infallible>>(led: &mut P, on: bool) {
    match drive_level(led, on) {
        Ok(()) => (),
        Err(e) => match e {},
    }
}

/**
 * Setup Timer 2 to interrupt once per sample.
 *
 * Every update event of TIM2 raises the TIM2 interrupt, and the interrupt
 * handler runs one tick of the receive pipeline. The handler must clear the
 * update interrupt flag (UIF) in the status register, or it will be
 * re-entered immediately.
 *
 * The timer is returned so that the handler can do that.
 */
pub fn sample_timer(
    freq: impl Into<Hertz>,
    tim2: pac::TIM2,
    apb1: &mut APB1,
    clocks: &Clocks,
) -> pac::TIM2 {
    let clk = APB1::get_timer_frequency(&clocks);
    pac::TIM2::enable(apb1);
    pac::TIM2::reset(apb1);
    let (psc, arr) = compute_arr_presc(freq.into().0, clk.0);

    // pause
    // CEN: Counter ENabled
    tim2.cr1.modify(|_, w| w.cen().clear_bit());
    // PSC: Prescaller
    tim2.psc.write(|w| w.psc().bits(psc));
    // ARR: Auto Reload Register
    tim2.arr.write(|w| w.arr().bits(arr));

    // URS: Update Request Source
    // Trigger an update event to load the prescaler value to the clock
    // Sets the URS bit to prevent an interrupt from being triggered by
    // the UG bit
    tim2.cr1.modify(|_, w| w.urs().set_bit());

    // EGR: Event Generation Register
    // UG: Force an update
    tim2.egr.write(|w| w.ug().set_bit());
    tim2.cr1.modify(|_, w| w.urs().clear_bit());

    // DIER: DMA/Interrupt Enable Register
    // UIE: Update Interrupt Enable
    tim2.dier.modify(|_, w| w.uie().set_bit());

    // start counter
    tim2.cr1.modify(|_, w| w.cen().set_bit());

    tim2
}

/// Acknowledge a TIM2 update interrupt.
#[inline(always)]
pub fn clear_update(tim2: &pac::TIM2) {
    // UIF: Update Interrupt Flag, cleared by writing 0
    tim2.sr.modify(|_, w| w.uif().clear_bit());
}

/// The trace log, in RAM where `state-slurp` can find it.
///
/// # Panics
///
/// This function is intended as initialization, and so will panic if called
/// more than once.
pub fn trace_log() -> &'static mut TraceLog {
    match singleton!(: TraceLog = TraceLog::new()) {
        Some(log) => log,
        None => panic!(),
    }
}
