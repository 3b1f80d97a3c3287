use crate::config;
use crate::events::AppEvent;
use crate::gui::ring::{self, RingGeometry, State, STARTUP_SHOW_DELAY_MS};
use crate::gui::theme::{self, ThemeColors};
use crate::sys::fetch::FetchRequest;
use gdk_pixbuf::prelude::PixbufLoaderExt;
use gdk_pixbuf::{InterpType, Pixbuf, PixbufLoader};
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

pub struct AppModel {
    pub state: Rc<RefCell<State>>,
    pub fetch_tx: async_channel::Sender<FetchRequest>,
    pub drawing_area: gtk::DrawingArea,
}

#[derive(Debug)]
pub enum AppMsg {
    PlayShow,
    PlayHide,
    SetOwnerSource(Option<PathBuf>),
    OwnerAvatarLoaded {
        generation: u64,
        result: Result<Vec<u8>, String>,
    },
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::PlayShow => AppMsg::PlayShow,
            AppEvent::PlayHide => AppMsg::PlayHide,
            AppEvent::SetOwnerSource(source) => AppMsg::SetOwnerSource(source),
            AppEvent::OwnerAvatarLoaded { generation, result } => {
                AppMsg::OwnerAvatarLoaded { generation, result }
            }
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (
        State,
        Option<PathBuf>,
        async_channel::Receiver<AppEvent>,
        async_channel::Sender<FetchRequest>,
    );
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("Orrery"),
            set_default_size: (420, 480),
            add_css_class: "orrery-window",

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,
                set_spacing: 12,
                set_margin_all: 12,

                #[name = "drawing_area"]
                gtk::DrawingArea {
                    set_hexpand: true,
                    set_vexpand: true,
                    add_css_class: "orrery-canvas",
                },

                gtk::Box {
                    set_orientation: gtk::Orientation::Horizontal,
                    set_spacing: 12,
                    set_halign: gtk::Align::Center,

                    gtk::Button {
                        set_label: "Show",
                        connect_clicked[sender] => move |_| {
                            sender.input(AppMsg::PlayShow);
                        }
                    },

                    gtk::Button {
                        set_label: "Hide",
                        connect_clicked[sender] => move |_| {
                            sender.input(AppMsg::PlayHide);
                        }
                    },
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (state, owner_source, rx, fetch_tx) = init;

        theme::load_css();

        let state = Rc::new(RefCell::new(state));

        let model = AppModel {
            state: state.clone(),
            fetch_tx,
            drawing_area: gtk::DrawingArea::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();

        let state_draw = state.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, width, height| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                if let Err(e) = ring::draw(cr, &mut state_draw.borrow_mut(), width, height, &colors)
                {
                    log::error!("Drawing error: {}", e);
                }
            });

        // Single scheduler for every animation: stamp the frame time, fold
        // finished transitions, redraw while anything is still moving.
        let state_tick = state.clone();
        widgets.drawing_area.add_tick_callback(move |area, clock| {
            let mut state = state_tick.borrow_mut();
            let now = clock.frame_time();
            state.frame_time_us = now;
            state.anim.settle(now);
            if state.anim.is_live(now) {
                area.queue_draw();
            }
            glib::ControlFlow::Continue
        });

        let state_map = state.clone();
        widgets.drawing_area.connect_map(move |area| {
            if let Some(clock) = area.frame_clock() {
                state_map.borrow_mut().anim.start_rotation(clock.frame_time());
            }
        });

        let state_unrealize = state.clone();
        widgets.drawing_area.connect_unrealize(move |_| {
            let mut state = state_unrealize.borrow_mut();
            state.anim.stop_rotation();
            state.release_images();
        });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        if owner_source.is_some() {
            sender.input(AppMsg::SetOwnerSource(owner_source));
        }

        let sender_show = sender.clone();
        glib::timeout_add_local_once(Duration::from_millis(STARTUP_SHOW_DELAY_MS), move || {
            sender_show.input(AppMsg::PlayShow);
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        match msg {
            AppMsg::PlayShow => {
                let now = self.now_us();
                self.state.borrow_mut().anim.play_show(now);
                self.drawing_area.queue_draw();
            }
            AppMsg::PlayHide => {
                let now = self.now_us();
                self.state.borrow_mut().anim.play_hide(now);
                self.drawing_area.queue_draw();
            }
            AppMsg::SetOwnerSource(source) => {
                self.request_owner(source);
            }
            AppMsg::OwnerAvatarLoaded { generation, result } => {
                let pixbuf = match result {
                    Ok(bytes) => self.decode_owner(&bytes),
                    // The fetcher already logged the failure; fall through
                    // to the placeholder state.
                    Err(_) => None,
                };
                if self.state.borrow_mut().complete_owner_load(generation, pixbuf) {
                    self.drawing_area.queue_draw();
                } else {
                    log::debug!("Dropping stale owner avatar result ({})", generation);
                }
            }
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    self.state.borrow_mut().apply_config(&new_config);
                    self.request_owner(new_config.owner_avatar);
                    self.drawing_area.queue_draw();
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
    }
}

impl AppModel {
    /// The current frame-clock time, or the last ticked time before the
    /// drawing area is realized.
    fn now_us(&self) -> i64 {
        self.drawing_area
            .frame_clock()
            .map(|clock| clock.frame_time())
            .unwrap_or_else(|| self.state.borrow().frame_time_us)
    }

    fn request_owner(&self, source: Option<PathBuf>) {
        match source.filter(|path| !path.as_os_str().is_empty()) {
            Some(path) => {
                let generation = self.state.borrow_mut().begin_owner_load();
                if let Err(e) = self.fetch_tx.send_blocking(FetchRequest {
                    generation,
                    source: path,
                }) {
                    log::error!("Owner avatar fetch queue closed: {}", e);
                }
            }
            None => self.state.borrow_mut().clear_owner(),
        }
        self.drawing_area.queue_draw();
    }

    fn decode_owner(&self, bytes: &[u8]) -> Option<Pixbuf> {
        let loader = PixbufLoader::new();
        loader
            .write(bytes)
            .and_then(|_| loader.close())
            .map_err(|e| log::warn!("Failed to decode owner avatar: {}", e))
            .ok()?;
        let pixbuf = loader.pixbuf()?;

        let side = f64::from(self.drawing_area.width().min(self.drawing_area.height()));
        let geom = RingGeometry::new(side, &self.state.borrow().tuning);
        let target = (geom.center_avatar_radius() * 2.0).round() as i32;
        if target > 0 {
            pixbuf.scale_simple(target, target, InterpType::Bilinear)
        } else {
            Some(pixbuf)
        }
    }
}
