// Copyright 2018 Ian Johnson

// This file is part of Chip-8.

// Chip-8 is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Chip-8 is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Chip-8.  If not, see <http://www.gnu.org/licenses/>.

//! The `chip8` binary program.

extern crate chip8vm;
extern crate clap;
extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
#[macro_use]
extern crate maplit;
extern crate sdl2;

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::process;
use std::thread;
use std::time::Duration;

use clap::{App, Arg, ArgMatches};
use failure::{Error, ResultExt};
use log::LevelFilter;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::Canvas;
use sdl2::video::Window;

use chip8vm::display;
use chip8vm::input::Key;
use chip8vm::interpreter::{Interpreter, Options};
use chip8vm::timer::{Timer, TIMER_FREQ};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// An SDL error.
#[derive(Debug, Fail)]
#[fail(display = "SDL error: {}", _0)]
struct SdlError(String);

/// The window the display buffer is presented in.
struct Display {
    /// The underlying SDL canvas.
    canvas: Canvas<Window>,
    /// The background color to use.
    bg: Color,
    /// The foreground color to use.
    fg: Color,
}

impl Display {
    /// Initializes the display and returns the resulting object.
    fn new(
        video_subsystem: sdl2::VideoSubsystem,
        width: u32,
        height: u32,
        bg: Color,
        fg: Color,
    ) -> Result<Self, Error> {
        let window = video_subsystem.window("Chip-8", width, height).build()?;
        let mut canvas = window.into_canvas().build()?;

        canvas.set_draw_color(bg);
        canvas.clear();
        canvas.present();

        Ok(Display { canvas, bg, fg })
    }

    /// Draws the given Chip-8 display buffer to the window.
    fn draw(&mut self, buffer: &display::Buffer) -> Result<(), SdlError> {
        let (width, height) = self.canvas.window().size();
        let scalex = width / display::WIDTH as u32;
        let scaley = height / display::HEIGHT as u32;

        self.canvas.set_draw_color(self.bg);
        self.canvas.clear();
        self.canvas.set_draw_color(self.fg);
        for (x, col) in buffer.data().iter().enumerate() {
            for (y, &pixel) in col.iter().enumerate() {
                if pixel {
                    let x = x as i32 * scalex as i32;
                    let y = y as i32 * scaley as i32;

                    self.canvas
                        .fill_rect(Rect::new(x, y, scalex, scaley))
                        .map_err(SdlError)?;
                }
            }
        }
        self.canvas.present();
        Ok(())
    }
}

/// A utility to process SDL key events and press/release the corresponding
/// keys in the interpreter's input state.
struct Controller {
    /// The map from keycodes to Chip-8 keys.
    keymap: HashMap<Keycode, Key>,
}

impl Controller {
    /// Returns a controller with the default keymap, which lays the hex
    /// keypad out over the left-hand side of a QWERTY keyboard.
    fn new() -> Self {
        use Keycode::*;
        use Key::*;

        let keymap = hashmap![
            Num1 => K1,
            Num2 => K2,
            Num3 => K3,
            Num4 => KC,
            Q => K4,
            W => K5,
            E => K6,
            R => KD,
            A => K7,
            S => K8,
            D => K9,
            F => KE,
            Z => KA,
            X => K0,
            C => KB,
            V => KF,
        ];
        Controller { keymap }
    }

    /// Processes the given SDL event, applying the corresponding action to the
    /// given interpreter.
    fn process(&self, event: Event, interpreter: &mut Interpreter) {
        match event {
            Event::KeyDown {
                keycode: Some(key), ..
            } => if let Some(&key) = self.keymap.get(&key) {
                interpreter.input_mut().press(key);
            },
            Event::KeyUp {
                keycode: Some(key), ..
            } => if let Some(&key) = self.keymap.get(&key) {
                interpreter.input_mut().release(key);
            },
            _ => {}
        }
    }
}

fn main() {
    let matches = App::new("chip8")
        .version(VERSION)
        .author("Ian Johnson <ianprime0509@gmail.com>")
        .about("A Chip-8 interpreter")
        .help_message("show this help message and exit")
        .version_message("show version information and exit")
        .arg(
            Arg::with_name("modern")
                .short("m")
                .long("modern")
                .help("use the behaviour of later interpreters for all quirks"),
        )
        .arg(
            Arg::with_name("no-vf-reset")
                .long("no-vf-reset")
                .help("do not reset VF on OR, AND and XOR"),
        )
        .arg(
            Arg::with_name("no-shift-quirk")
                .long("no-shift-quirk")
                .help("shift Vx in place instead of copying Vy first"),
        )
        .arg(
            Arg::with_name("no-load-quirk")
                .long("no-load-quirk")
                .help("leave I unchanged after block loads and stores"),
        )
        .arg(
            Arg::with_name("add-i-overflow")
                .long("add-i-overflow")
                .help("set VF when ADD I, Vx leaves the address space"),
        )
        .arg(
            Arg::with_name("wrap")
                .short("w")
                .long("wrap")
                .help("wrap sprites around the display edges instead of clipping"),
        )
        .arg(
            Arg::with_name("speed")
                .long("speed")
                .value_name("IPS")
                .help("set the number of instructions executed per second")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("scale")
                .short("s")
                .long("scale")
                .value_name("SCALE")
                .help("set game display scale")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("increase verbosity"),
        )
        .arg(
            Arg::with_name("FILE")
                .help("set the program file to run")
                .required(true)
                .index(1),
        )
        .get_matches();

    let verbosity = matches.occurrences_of("verbose");
    let filter = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, filter)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(&matches) {
        error!("{}", e);
        for cause in e.iter_causes() {
            info!("caused by: {}", cause);
        }
        trace!("backtrace: {}", e.backtrace());
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let opts = process_opts(matches);
    let scale = matches
        .value_of("scale")
        .map(|n| n.parse::<u32>())
        .unwrap_or(Ok(10))
        .context("invalid scale argument")?;
    let speed = matches
        .value_of("speed")
        .map(|n| n.parse::<u32>())
        .unwrap_or(Ok(700))
        .context("invalid speed argument")?;
    if speed == 0 {
        return Err(InvalidArgumentError("speed must be positive").into());
    }

    let filename = matches.value_of("FILE").unwrap();
    let mut input =
        File::open(filename).with_context(|_| format!("could not open file '{}'", filename))?;
    let mut interpreter = Interpreter::with_options(opts);
    interpreter
        .load_program(&mut input)
        .with_context(|_| format!("could not load program from file '{}'", filename))?;

    let sdl_context = sdl2::init()
        .map_err(SdlError)
        .context("could not initialize SDL")?;
    let video_subsystem = sdl_context
        .video()
        .map_err(SdlError)
        .context("could not initialize SDL video subsystem")?;
    let mut event_pump = sdl_context
        .event_pump()
        .map_err(SdlError)
        .context("could not initialize SDL event loop")?;
    let mut display = Display::new(
        video_subsystem,
        display::WIDTH as u32 * scale,
        display::HEIGHT as u32 * scale,
        Color::RGB(0, 0, 0),
        Color::RGB(255, 255, 255),
    )?;
    let controller = Controller::new();
    // Instructions and timer ticks are paced by separate clocks, so changing
    // the speed never changes how fast the timers count down.
    let mut clock = Timer::new(speed);
    let mut timer = Timer::new(TIMER_FREQ);
    interpreter.display_mut().force_refresh();

    'main: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'main,
                Event::Window { .. } => interpreter.display_mut().force_refresh(),
                e => controller.process(e, &mut interpreter),
            }
        }

        for _ in 0..clock.lap() {
            interpreter.step();
        }
        interpreter.tick_timers(timer.lap());
        interpreter
            .display_mut()
            .refresh(|buf| display.draw(buf))
            .context("could not refresh display window")?;
        thread::sleep(Duration::from_millis(1));
    }

    Ok(())
}

/// An error resulting from a bad command-line argument.
#[derive(Debug, Fail)]
#[fail(display = "{}", _0)]
struct InvalidArgumentError(&'static str);

/// Builds the interpreter options from the command-line arguments.
fn process_opts(matches: &ArgMatches) -> Options {
    let mut opts = if matches.is_present("modern") {
        Options::modern()
    } else {
        Options::new()
    };
    if matches.is_present("no-vf-reset") {
        opts.logic_resets_vf = false;
    }
    if matches.is_present("no-shift-quirk") {
        opts.shift_copies_vy = false;
    }
    if matches.is_present("no-load-quirk") {
        opts.load_store_increments_i = false;
    }
    if matches.is_present("add-i-overflow") {
        opts.add_i_sets_vf = true;
    }
    if matches.is_present("wrap") {
        opts.wrap_sprites = true;
    }

    opts
}
