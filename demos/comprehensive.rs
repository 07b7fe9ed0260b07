use std::time::{Duration, Instant};
use winit::event::{Event, StartCause, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winmica::{Backdrop, Compositor, Severity, Status, WindowHandle};

/// How long to wait after the window is created before attaching the
/// backdrop, so that its native surface exists by then.
const APPLY_DELAY: Duration = Duration::from_millis(100);

fn report(status: &Status) {
	match status.severity() {
		Severity::Success => log::info!("Status: {}", status),
		Severity::Warning => log::warn!("Status: {}", status),
		Severity::Error => log::error!("Status: {}", status),
	}
}

fn describe_system(compositor: &Compositor) {
	log::info!("System Information\n{}", compositor.capabilities());

	let theme = if compositor.is_dark_mode() { "Dark Mode" } else { "Light Mode" };
	log::info!("Current Theme: {}", theme);
}

fn main() {
	env_logger::Builder::from_env(
		env_logger::Env::default().default_filter_or("info")).init();

	let compositor = Compositor::native();
	describe_system(&compositor);

	let event_loop = EventLoop::new();
	let window = winit::window::WindowBuilder::new()
		.with_title("Mica Effects Test")
		.with_transparent(true)
		.with_position(winit::dpi::PhysicalPosition::new(100, 100))
		.with_inner_size(winit::dpi::PhysicalSize::new(900, 700))
		.build(&event_loop).unwrap();
	let handle = WindowHandle::from_window(&window).unwrap();

	log::info!(
		"Press 1 for Mica, 2 for Mica Alt, 3 for Auto, 0 to disable or R to \
		 refresh the system information.");

	let mut current = Backdrop::Mica;
	event_loop.run(move |event, _, flow| match event {
		Event::NewEvents(StartCause::Init) =>
			*flow = ControlFlow::WaitUntil(Instant::now() + APPLY_DELAY),
		Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
			report(&compositor.apply_with_status(handle, current));
			*flow = ControlFlow::Wait;
		},
		Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
			WindowEvent::ReceivedCharacter(key) => {
				let kind = match key {
					'0' => Backdrop::Disabled,
					'1' => Backdrop::Mica,
					'2' => Backdrop::MicaAlt,
					'3' => Backdrop::Auto,
					'r' | 'R' => return describe_system(&compositor),
					_ => return
				};

				let status = compositor.apply_with_status(handle, kind);
				if status.severity() != Severity::Error {
					current = kind;
				}
				report(&status);
			},
			WindowEvent::ThemeChanged(_) => describe_system(&compositor),
			WindowEvent::CloseRequested => *flow = ControlFlow::Exit,
			_ => {}
		},
		_ => {}
	})
}
