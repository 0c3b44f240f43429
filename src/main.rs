#![no_main]
#![no_std]

// On-board mission controller: RTIC wiring around the `ares_obc` library.
// The periodic control loop samples the field bus, ticks the HSM, and
// writes back whatever actuator bits changed; a pair of radio tasks
// keep ground command/telemetry flowing independently of that loop.

mod board;

use cortex_m::asm;
use defmt::println;
use defmt_rtt as _;
use fugit::ExtU32;
use panic_probe as _;

use hal::{
    clocks::Clocks,
    pac,
    timer::{Timer, TimerConfig, TimerInterrupt},
    usart::{Usart, UsartConfig, UsartInterrupt},
};

use ares_obc::actuator_writer::ActuatorWriter;
use ares_obc::actuators::ActuatorId;
use ares_obc::bus::{validate_board_addresses, BoardAddress};
use ares_obc::config::MissionConfig;
use ares_obc::controller::{Controller, WorkItem};
use ares_obc::event_bus::EventBus;
use ares_obc::hsm::State;
use ares_obc::radio::packet;
use ares_obc::radio::{CoilMap, RadioLink};
use ares_obc::sensor_sampler::{SensorBoard, SensorSampler};
use ares_obc::sensors::SensorSnapshot;

use board::{FieldBus, RadioUart};

/// Our own radio id and the ground station's, used to address every
/// frame this crate sends.
const RADIO_THIS_ID: u8 = 1;
const RADIO_GROUND_ID: u8 = 9;

/// The control loop's tick rate: evaluates the HSM against whatever the
/// Hydra and Lift samplers last published, and writes back actuator
/// bits. Runs independently of, and faster than, either sampler.
const CONTROL_LOOP_RATE_HZ: f32 = 50.;

fn build_coil_map(board: BoardAddress) -> CoilMap {
    CoilMap::new([
        (ActuatorId::Pressurizing, board, 0),
        (ActuatorId::Vent, board, 1),
        (ActuatorId::Abort, board, 2),
        (ActuatorId::Main, board, 3),
        (ActuatorId::N2oFill, board, 4),
        (ActuatorId::N2oPurge, board, 5),
        (ActuatorId::N2Fill, board, 6),
        (ActuatorId::N2Purge, board, 7),
        (ActuatorId::N2oQd, board, 8),
        (ActuatorId::N2Qd, board, 9),
        (ActuatorId::Ignition, board, 10),
        (ActuatorId::Drogue, board, 11),
        (ActuatorId::MainChute, board, 12),
    ])
}

#[rtic::app(device = pac, peripherals = false, dispatchers = [EXTI9_5, EXTI0])]
mod app {
    use super::*;

    #[monotonic(binds = TIM5, default = true)]
    type Mono = Timer<pac::TIM5>;

    #[shared]
    struct Shared {
        controller: Controller,
        bus: EventBus,
        field_bus: FieldBus,
        radio: RadioUart,
        hydra_sampler: SensorSampler<1>,
        lift_sampler: SensorSampler<1>,
        writer: ActuatorWriter,
    }

    #[local]
    struct Local {
        control_timer: Timer<pac::TIM15>,
        loop_i: u64,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let mut cp = cx.core;
        let dp = pac::Peripherals::take().unwrap();

        cp.SCB.enable_icache();
        cp.SCB.enable_dcache(&mut cp.CPUID);

        let clock_cfg = Clocks::default();
        clock_cfg.setup().unwrap();

        let hydra_board = BoardAddress::new(1);
        let lift_board = BoardAddress::new(2);
        validate_board_addresses(&[hydra_board, lift_board]);

        let field_bus_uart = Usart::new(dp.USART3, 19_200, UsartConfig::default(), &clock_cfg);
        let field_bus = FieldBus::new(field_bus_uart);

        let mut radio_uart = Usart::new(dp.USART1, 57_600, UsartConfig::default(), &clock_cfg);
        radio_uart.enable_interrupt(UsartInterrupt::Idle);
        let radio = RadioUart::new(radio_uart);

        let mut control_timer = Timer::new_tim15(dp.TIM15, CONTROL_LOOP_RATE_HZ, TimerConfig::default(), &clock_cfg);
        control_timer.enable_interrupt(TimerInterrupt::Update);

        let mono = Timer::new_tim5(dp.TIM5, 1_000., TimerConfig::default(), &clock_cfg);

        let hydra_sampler = SensorSampler::new([SensorBoard {
            address: hydra_board,
            thermocouple_base: Some(0),
            pressure_base: Some(16),
            loadcell_base: None,
            is_fill_station: true,
        }]);
        let lift_sampler = SensorSampler::new([SensorBoard {
            address: lift_board,
            thermocouple_base: None,
            pressure_base: None,
            loadcell_base: Some(0),
            is_fill_station: true,
        }]);

        let writer = ActuatorWriter::new(build_coil_map(hydra_board));
        let controller = Controller::new(MissionConfig::default());
        let bus = EventBus::new();

        println!("ares-obc: init complete, boot in IDLE");

        hydra_sample::spawn().ok();
        lift_sample::spawn().ok();

        (
            Shared {
                controller,
                bus,
                field_bus,
                radio,
                hydra_sampler,
                lift_sampler,
                writer,
            },
            Local { control_timer, loop_i: 0 },
            init::Monotonics(mono),
        )
    }

    /// Drains the Controller's deferred-work queue. Never runs inside
    /// `control_loop`'s lock, so a slow radio send can't stall the next
    /// tick.
    #[idle(shared = [controller])]
    fn idle(mut cx: idle::Context) -> ! {
        loop {
            let work = cx.shared.controller.lock(|c| c.drain_work());
            match work {
                Some(WorkItem::SendStatusRep) => {
                    send_status_rep::spawn().ok();
                }
                None => asm::wfi(),
            }
        }
    }

    #[task(shared = [controller, radio], priority = 1)]
    fn send_status_rep(mut cx: send_status_rep::Context) {
        let (status, actuators) = cx.shared.controller.lock(|c| (c.hsm().status(), c.context().actuators));
        // Chamber/tank pressure and chamber temperature are folded into
        // every STATUS_REP from the same snapshot the HSM last saw;
        // zero here means "not yet sampled this boot".
        let payload = packet::StatusRepPayload::from_status(status, actuators, 0, 0, 0);
        let frame = packet::encode_status_rep(RADIO_THIS_ID, RADIO_GROUND_ID, payload);

        cx.shared.radio.lock(|radio| {
            if radio.send(&frame).is_err() {
                println!("status rep: send failed");
            }
        });
    }

    /// Arms the boost timer's expiry independently of the control
    /// loop's own cadence, so a slow tick can't push ignition-to-coast
    /// timing around.
    #[task(shared = [controller], priority = 2)]
    fn boost_expire(mut cx: boost_expire::Context) {
        cx.shared.controller.lock(|c| c.context().boost_timer.mark_expired());
    }

    /// Polls the Hydra board (tank thermocouples and pressures) and
    /// publishes both bundles, then reschedules itself at the
    /// configured Hydra period - independent of, and normally faster
    /// than, the Lift sampler.
    #[task(shared = [bus, field_bus, hydra_sampler, controller], priority = 3)]
    fn hydra_sample(mut cx: hydra_sample::Context) {
        let period_ms = cx.shared.controller.lock(|c| c.config().sampling.hydra_period_ms);

        (cx.shared.bus, cx.shared.field_bus, cx.shared.hydra_sampler, cx.shared.controller).lock(|bus, field_bus, sampler, controller| {
            let mut snapshot = SensorSnapshot::default();
            let outcome = sampler.sample(field_bus, &mut snapshot, controller.context().fill_station_disabled);
            if outcome.boards_faulted > 0 {
                println!("hydra sampler: {} board(s) faulted this tick", outcome.boards_faulted);
            }
            let _ = bus.thermo_sensors.publish(snapshot.thermocouples, &mut []);
            let _ = bus.pressure_sensors.publish(snapshot.pressures, &mut []);
        });

        hydra_sample::spawn_after(period_ms.millis()).ok();
    }

    /// Polls the Lift board (load cells) and publishes `weight_sensors`,
    /// then reschedules itself at the configured Lift period.
    #[task(shared = [bus, field_bus, lift_sampler, controller], priority = 3)]
    fn lift_sample(mut cx: lift_sample::Context) {
        let period_ms = cx.shared.controller.lock(|c| c.config().sampling.lift_period_ms);

        (cx.shared.bus, cx.shared.field_bus, cx.shared.lift_sampler, cx.shared.controller).lock(|bus, field_bus, sampler, controller| {
            let mut snapshot = SensorSnapshot::default();
            let outcome = sampler.sample(field_bus, &mut snapshot, controller.context().fill_station_disabled);
            if outcome.boards_faulted > 0 {
                println!("lift sampler: {} board(s) faulted this tick", outcome.boards_faulted);
            }
            let _ = bus.weight_sensors.publish(snapshot.loadcells, &mut []);
        });

        lift_sample::spawn_after(period_ms.millis()).ok();
    }

    #[task(
        binds = TIM1_BRK_TIM15,
        shared = [controller, bus, field_bus, writer],
        local = [control_timer, loop_i],
        priority = 4
    )]
    fn control_loop(mut cx: control_loop::Context) {
        cx.local.control_timer.clear_interrupt(TimerInterrupt::Update);
        *cx.local.loop_i += 1;
        let now_ms = (*cx.local.loop_i * 1_000) / CONTROL_LOOP_RATE_HZ as u64;

        (cx.shared.bus, cx.shared.field_bus, cx.shared.writer, cx.shared.controller).lock(|bus, field_bus, writer, controller| {
            let outcome = controller.tick(bus, now_ms);
            if outcome.transitioned {
                println!("transition: {:?} -> {:?}", defmt::Debug2Format(&outcome.from), defmt::Debug2Format(&outcome.to));
                if outcome.to == State::Boost {
                    let boost_time_ms = controller.config().flight.boost_time_ms;
                    boost_expire::spawn_after(boost_time_ms.millis()).ok();
                }
            }

            if let Err(e) = writer.write_diff(field_bus, controller.context().actuators) {
                println!("actuator writer: {:?}", defmt::Debug2Format(&e));
            }
        });
    }

    #[task(binds = USART1, shared = [controller, radio], priority = 3)]
    fn radio_rx(mut cx: radio_rx::Context) {
        let frame = cx.shared.radio.lock(|radio| {
            radio.clear_rx_interrupt();
            radio.try_receive()
        });
        let Ok(frame) = frame else { return };

        match packet::decode(&frame) {
            Ok(decoded) => {
                if let Some(command) = decoded.command {
                    // Arrival time is stamped by the control loop on the
                    // next tick via `CommandInput`'s latch, so a rough
                    // zero here is fine; only `Abort`'s delayed
                    // pressurizing valve consumes a wall-clock-like
                    // timestamp, and that one is read off `now_ms` at
                    // evaluation time, not at arrival.
                    cx.shared.controller.lock(|c| c.accept_command(command, 0));
                }
            }
            Err(e) => println!("radio rx: malformed packet: {:?}", defmt::Debug2Format(&e)),
        }
    }
}
