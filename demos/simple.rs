use winmica::{Backdrop, Compositor, Severity, WindowHandle};

fn main() {
	env_logger::Builder::from_env(
		env_logger::Env::default().default_filter_or("info")).init();

	let compositor = Compositor::native();
	if !compositor.is_supported() {
		log::warn!("Mica effects are not supported on this system.");
		log::warn!("The example will still run but effects will not be applied.");
	}

	let event_loop = winit::event_loop::EventLoop::new();
	let window = winit::window::WindowBuilder::new()
		.with_title("Simple Mica Example")
		.with_resizable(true)
		.with_decorations(true)
		.with_transparent(true)
		.with_inner_size(winit::dpi::PhysicalSize::new(800, 600))
		.build(&event_loop).unwrap();
	let handle = WindowHandle::from_window(&window).unwrap();

	log::info!("Press 1 for Mica, 2 for Mica Alt or 3 for Auto.");

	event_loop.run(move |event, _, flow| {
		*flow = winit::event_loop::ControlFlow::Wait;
		match event {
			winit::event::Event::WindowEvent { window_id, event }
			if window_id == window.id() => match event {

				winit::event::WindowEvent::ReceivedCharacter(key) => {
					let kind = match key {
						'1' => Backdrop::Mica,
						'2' => Backdrop::MicaAlt,
						'3' => Backdrop::Auto,
						_ => return
					};

					let status = compositor.apply_with_status(handle, kind);
					match status.severity() {
						Severity::Success => log::info!("{}", status),
						_ => log::warn!("{}", status),
					}
				},
				winit::event::WindowEvent::CloseRequested =>
					*flow = winit::event_loop::ControlFlow::Exit,
				_ => {}
			},
			_ => {}
		}
	})
}
