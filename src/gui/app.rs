use crate::config::{self, Config, Overrides, WindowMode};
use crate::content;
use crate::events::AppEvent;
use crate::gui::scene::CairoScene;
use crate::gui::theme::{self, ThemeColors};
use crate::gui::view;
use crate::sys::navigate::{self, CaseUrl};
use carousel::{EscapedKey, Key, Point, RadialCarousel, Viewport};
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

/// Wheel steps arrive as ±1 per notch; browsers report about this many
/// pixels for the same notch.
const SCROLL_STEP_PIXELS: f64 = 100.0;

type Carousel = RadialCarousel<CairoScene>;

pub struct AppModel {
    carousel: Rc<RefCell<Carousel>>,
    config: Config,
    config_path: PathBuf,
    overrides: Overrides,
    site_url: Rc<RefCell<String>>,
    /// Keyboard-focused slot; drawn with a ring.
    focus: Rc<Cell<Option<usize>>>,
    pointer_over: Option<usize>,
    touch_origin: Option<f64>,
    ticking: Rc<Cell<bool>>,
    drawing_area: gtk::DrawingArea,
}

#[derive(Debug)]
pub enum AppMsg {
    Scroll(f64),
    TouchBegin(f64),
    TouchUpdate(f64),
    TouchEnd,
    Motion(Point),
    PointerExit,
    Press(Point),
    KeyPress(gdk::Key),
    KeyRelease(gdk::Key),
    Resize(i32, i32),
    ConfigReload,
    ContentReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::ConfigReload => AppMsg::ConfigReload,
            AppEvent::ContentReload => AppMsg::ContentReload,
        }
    }
}

fn activation_key(key: gdk::Key) -> Key {
    match key {
        gdk::Key::Return | gdk::Key::KP_Enter | gdk::Key::ISO_Enter => Key::Enter,
        gdk::Key::space | gdk::Key::KP_Space => Key::Space,
        _ => Key::Other,
    }
}

fn next_focus(focus: Option<usize>, count: usize, backwards: bool) -> Option<usize> {
    if count == 0 {
        return None;
    }
    Some(match (focus, backwards) {
        (None, false) => 0,
        (None, true) => count - 1,
        (Some(i), false) => (i + 1) % count,
        (Some(i), true) => (i + count - 1) % count,
    })
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (
        Config,
        PathBuf,
        Overrides,
        async_channel::Receiver<AppEvent>,
    );
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some(model.config.window.title.as_str()),
            set_default_size: (model.config.window.width, model.config.window.height),
            add_css_class: "folio-window",

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    sender.input(AppMsg::KeyPress(key));
                    glib::Propagation::Stop
                },
                connect_key_released[sender] => move |_, key, _, _| {
                    sender.input(AppMsg::KeyRelease(key));
                }
            },

            #[name = "drawing_area"]
            gtk::DrawingArea {
                set_hexpand: true,
                set_vexpand: true,
                add_css_class: "folio-canvas",

                connect_resize[sender] => move |_, width, height| {
                    sender.input(AppMsg::Resize(width, height));
                },

                add_controller = gtk::EventControllerMotion {
                    connect_motion[sender] => move |_, x, y| {
                        sender.input(AppMsg::Motion(Point::new(x, y)));
                    },
                    connect_leave[sender] => move |_| {
                        sender.input(AppMsg::PointerExit);
                    }
                },

                add_controller = gtk::EventControllerScroll::new(
                    gtk::EventControllerScrollFlags::VERTICAL
                ) {
                    connect_scroll[sender] => move |_, _, dy| {
                        sender.input(AppMsg::Scroll(dy * SCROLL_STEP_PIXELS));
                        glib::Propagation::Stop
                    }
                },

                add_controller = gtk::GestureClick {
                    connect_released[sender] => move |_, _, x, y| {
                        sender.input(AppMsg::Press(Point::new(x, y)));
                    }
                },

                add_controller = gtk::GestureDrag {
                    set_touch_only: true,
                    connect_drag_begin[sender] => move |_, _, y| {
                        sender.input(AppMsg::TouchBegin(y));
                    },
                    connect_drag_update[sender] => move |_, _, dy| {
                        sender.input(AppMsg::TouchUpdate(dy));
                    },
                    connect_drag_end[sender] => move |_, _, _| {
                        sender.input(AppMsg::TouchEnd);
                    }
                }
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (config, config_path, overrides, rx) = init;

        theme::load_css();

        let site_url = Rc::new(RefCell::new(config.content.site_url.clone()));
        let navigate_url = site_url.clone();
        let navigate = Box::new(move |key: EscapedKey| {
            let url = CaseUrl::new(&navigate_url.borrow(), &key);
            if let Err(e) = navigate::open_case(&url) {
                log::error!("Failed to open {}: {}", url, e);
            }
        });

        let viewport = Viewport::new(
            config.window.width as f64,
            config.window.height as f64,
        );
        let mut carousel = RadialCarousel::new(
            CairoScene::new(config.content.image_root.clone()),
            config.carousel.clone(),
            viewport,
            navigate,
        );
        carousel.set_base_path(config.content.base_path.clone());
        carousel
            .scene_mut()
            .set_base_path(config.content.base_path.clone());
        carousel.set_items(content::cached_items(), Instant::now());

        let model = AppModel {
            carousel: Rc::new(RefCell::new(carousel)),
            config,
            config_path,
            overrides,
            site_url,
            focus: Rc::new(Cell::new(None)),
            pointer_over: None,
            touch_origin: None,
            ticking: Rc::new(Cell::new(false)),
            drawing_area: gtk::DrawingArea::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();

        let carousel_draw = model.carousel.clone();
        let focus_draw = model.focus.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, _, _| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                let carousel = carousel_draw.borrow();
                let focus = focus_draw
                    .get()
                    .and_then(|slot| carousel.state().registry.entry(slot))
                    .map(|entry| entry.label);
                if let Err(e) = view::draw(cr, carousel.scene(), focus, &colors, Instant::now()) {
                    log::error!("Drawing error: {}", e);
                }
            });

        match model.config.window.mode {
            WindowMode::Windowed => {}
            WindowMode::Maximized => root.maximize(),
            WindowMode::Fullscreen => root.fullscreen(),
        }

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        model.ensure_ticking();

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        let now = Instant::now();
        match msg {
            AppMsg::Scroll(dy) => self.carousel.borrow_mut().wheel(dy),
            AppMsg::TouchBegin(y) => {
                self.touch_origin = Some(y);
                self.carousel.borrow_mut().touch_start(y);
            }
            AppMsg::TouchUpdate(offset) => {
                if let Some(origin) = self.touch_origin {
                    self.carousel.borrow_mut().touch_move(origin + offset);
                }
            }
            AppMsg::TouchEnd => {
                self.touch_origin = None;
                self.carousel.borrow_mut().touch_end();
            }
            AppMsg::Motion(point) => {
                let mut carousel = self.carousel.borrow_mut();
                let hit = carousel.scene().hit_test(point);
                if hit != self.pointer_over {
                    if let Some(old) = self.pointer_over {
                        carousel.pointer_leave(old, now);
                    }
                    if let Some(new) = hit {
                        carousel.pointer_enter(new, Some(point), now);
                    }
                    self.pointer_over = hit;
                }
                carousel.pointer_move(point, now);
            }
            AppMsg::PointerExit => {
                if let Some(old) = self.pointer_over.take() {
                    self.carousel.borrow_mut().pointer_leave(old, now);
                }
            }
            AppMsg::Press(point) => {
                let mut carousel = self.carousel.borrow_mut();
                if let Some(slot) = carousel.scene().hit_test(point) {
                    carousel.click(slot);
                }
            }
            AppMsg::KeyPress(key) => match key {
                gdk::Key::Tab | gdk::Key::ISO_Left_Tab => {
                    let count = self.carousel.borrow().items().len();
                    let focus =
                        next_focus(self.focus.get(), count, key == gdk::Key::ISO_Left_Tab);
                    self.focus.set(focus);
                }
                gdk::Key::Escape => self.focus.set(None),
                _ => {
                    if let Some(slot) = self.focus.get() {
                        self.carousel
                            .borrow_mut()
                            .key_down(slot, activation_key(key), now);
                    }
                }
            },
            AppMsg::KeyRelease(key) => {
                if let Some(slot) = self.focus.get() {
                    self.carousel
                        .borrow_mut()
                        .key_up(slot, activation_key(key), now);
                }
            }
            AppMsg::Resize(width, height) => {
                self.carousel
                    .borrow_mut()
                    .resize(Viewport::new(width as f64, height as f64), now);
            }
            AppMsg::ConfigReload => self.reload_config(now),
            AppMsg::ContentReload => self.reload_content(now),
        }

        self.ensure_ticking();
        self.drawing_area.queue_draw();
    }
}

impl AppModel {
    /// Keeps a frame callback alive while the carousel has pending work or
    /// the scene is still fading.
    fn ensure_ticking(&self) {
        if self.ticking.replace(true) {
            return;
        }
        let carousel = self.carousel.clone();
        let ticking = self.ticking.clone();
        self.drawing_area.add_tick_callback(move |area, _| {
            let now = Instant::now();
            let active = carousel.borrow_mut().frame(now);
            let animating = carousel.borrow().scene().is_animating(now);
            area.queue_draw();
            if active || animating {
                glib::ControlFlow::Continue
            } else {
                ticking.set(false);
                glib::ControlFlow::Break
            }
        });
    }

    fn reload_content(&mut self, now: Instant) {
        let count = content::refresh_cache(
            &self.config.content.cases_dir,
            self.config.content.max_items,
        );
        log::info!("Content reloaded, {} published cases", count);
        self.carousel
            .borrow_mut()
            .set_items(content::cached_items(), now);
        self.reset_pointer_tracking();
    }

    fn reload_config(&mut self, now: Instant) {
        let mut new_config = match config::load_config(&self.config_path) {
            Ok(c) => c,
            Err(e) => {
                log::error!("Failed to reload config: {}", e);
                return;
            }
        };
        self.overrides.apply(&mut new_config);

        let (old, new) = (&self.config.content, &new_config.content);
        let cases_moved = old.cases_dir != new.cases_dir || old.max_items != new.max_items;
        let images_moved = old.base_path != new.base_path || old.image_root != new.image_root;

        {
            let mut carousel = self.carousel.borrow_mut();
            carousel.set_base_path(new.base_path.clone());
            carousel.scene_mut().set_image_root(new.image_root.clone());
            carousel.scene_mut().set_base_path(new.base_path.clone());
            carousel.set_tuning(new_config.carousel.clone(), now);
            if images_moved && !cases_moved {
                carousel.rebuild(now);
            }
        }
        *self.site_url.borrow_mut() = new.site_url.clone();

        self.config = new_config;
        log::info!("Configuration reloaded");

        if cases_moved {
            self.reload_content(now);
        } else {
            self.reset_pointer_tracking();
        }
    }

    /// Rebuilt bindings have no hovered or focused slot.
    fn reset_pointer_tracking(&mut self) {
        self.pointer_over = None;
        let count = self.carousel.borrow().items().len();
        if self.focus.get().is_some_and(|slot| slot >= count) {
            self.focus.set(None);
        }
    }
}
