//! Display driver task
//!
//! The driver owns the panel, the scene and the touch controller. Other
//! tasks mutate the scene through [`DisplayDriver::with_scene`] and the
//! wrappers built on it; every change lands in the dirty-region set and
//! raises the update signal. The display task itself only runs
//! [`DisplayDriver::run`].
//!
//! # Render loop
//!
//! One iteration waits for the update signal (at most [`UPDATE_TIMEOUT`]),
//! redraws the rectangles that were pending when it woke, then samples the
//! touch panel. Rectangles are streamed line by line through two line
//! buffers: while line `k - 1` is on the bus, line `k` is rendered into the
//! other buffer.
//!
//! Dirty rectangles are stored in panel coordinates. In
//! [`UpdateMode::LeftRight`] the panel runs a quarter turn ahead of the
//! logical rotation, so a panel line is a logical column.

use core::cell::Cell;
use core::convert::Infallible;

use embassy_futures::join::join;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};

use stratum_core::config::{DisplayConfig, TouchCalibration, UpdateMode};
use stratum_core::region::DEFAULT_REGIONS;
use stratum_core::traits::{DisplayDevice, Rotation, TouchDevice};
use stratum_core::{
    ActionEvent, Color, DamageSink, DirtyRegions, Error, PixelFormat, Rect, Result, Scene,
    VisHandle, Widget,
};

use crate::touch::TouchTracker;

/// Longest wait for a screen update before touch is sampled anyway
pub const UPDATE_TIMEOUT: Duration = Duration::from_millis(50);

/// Touch sampling is skipped for one cycle when the lock is busy this long
pub const TOUCH_LOCK_TIMEOUT: Duration = Duration::from_millis(1);

/// Default line buffer length, enough for a 320 pixel wide panel
pub const DEFAULT_BUF_LEN: usize = 320;

const BORDER_COLORS: [Color; 6] = [
    Color::RED,
    Color::GREEN,
    Color::BLUE,
    Color::YELLOW,
    Color::CYAN,
    Color::MAGENTA,
];

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverState {
    /// No successful [`DisplayDriver::setup`] yet
    Uninitialized,
    /// Set up, render loop not started
    Ready,
    /// Render loop running
    Running,
}

/// Lock-free snapshot readable from any task
#[derive(Debug, Clone, Copy)]
struct Status {
    state: DriverState,
    width: i32,
    height: i32,
    update_mode: UpdateMode,
    rotation: Rotation,
    inverted: bool,
    calibrating: bool,
    touch: Option<(i32, i32)>,
}

/// Logical screen size and scan direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Viewport {
    width: i32,
    height: i32,
    mode: UpdateMode,
}

impl Viewport {
    /// Clip a logical area and map it to panel coordinates
    ///
    /// `None` when nothing of the area is on screen.
    fn to_panel(&self, area: Rect) -> Option<Rect> {
        let clamped = area.clamp(self.width, self.height);
        if !clamped.is_valid() {
            return None;
        }
        let mut rect = match self.mode {
            UpdateMode::TopBottom => clamped,
            UpdateMode::LeftRight => Rect::new(
                clamped.y_start,
                self.width - 1 - clamped.x_end,
                clamped.y_end,
                self.width - 1 - clamped.x_start,
            ),
        };
        if Color::EVEN_COORDINATES {
            // Two pixels per byte: cover whole bytes along the line
            rect.x_start &= !1;
            rect.x_end = (rect.x_end | 1).min(self.panel_width() - 1);
        }
        Some(rect)
    }

    /// Length of one panel line
    fn panel_width(&self) -> i32 {
        match self.mode {
            UpdateMode::TopBottom => self.width,
            UpdateMode::LeftRight => self.height,
        }
    }
}

/// Damage sink handed to scene code running under the line lock
///
/// Areas are clipped to the screen and mapped to panel coordinates before
/// they reach the dirty-region set.
pub struct Damage<'a, const N: usize> {
    regions: &'a mut DirtyRegions<N>,
    viewport: Viewport,
    pushed: usize,
}

impl<'a, const N: usize> Damage<'a, N> {
    fn new(regions: &'a mut DirtyRegions<N>, viewport: Viewport) -> Self {
        Self {
            regions,
            viewport,
            pushed: 0,
        }
    }

    /// Number of areas recorded so far
    pub fn pushed(&self) -> usize {
        self.pushed
    }
}

impl<const N: usize> DamageSink for Damage<'_, N> {
    fn invalidate(&mut self, area: Rect) {
        if let Some(rect) = self.viewport.to_panel(area) {
            if self.regions.push(rect).is_ok() {
                self.pushed += 1;
            }
        }
    }
}

/// State behind the frame lock
struct Frame<D, const BUF_LEN: usize> {
    device: Option<D>,
    buffers: [[Color; BUF_LEN]; 2],
    border: usize,
}

/// State behind the line lock
struct Canvas<W, const OBJS: usize, const REGIONS: usize> {
    scene: Scene<W, OBJS>,
    regions: DirtyRegions<REGIONS>,
    /// Explicit update request, drawn as is
    direct: Option<Rect>,
    viewport: Viewport,
    background: Color,
    debug_borders: bool,
}

impl<W: Widget, const OBJS: usize, const REGIONS: usize> Canvas<W, OBJS, REGIONS> {
    fn invalidate(&mut self, area: Rect) -> Result<()> {
        let rect = self.viewport.to_panel(area).ok_or(Error::BadParameter)?;
        self.regions.push(rect)
    }

    fn invalidate_all(&mut self) -> Result<()> {
        self.regions.clear();
        self.direct = None;
        self.invalidate(Rect::from_size(
            0,
            0,
            self.viewport.width,
            self.viewport.height,
        ))
    }

    fn set_direct(&mut self, area: Rect) -> Result<()> {
        let rect = self.viewport.to_panel(area).ok_or(Error::BadParameter)?;
        self.direct = Some(match self.direct {
            Some(current) => current.union(&rect),
            None => rect,
        });
        Ok(())
    }

    /// Apply a new screen geometry; everything is redrawn
    fn reset(&mut self, width: i32, height: i32, mode: UpdateMode) {
        self.viewport = Viewport {
            width,
            height,
            mode,
        };
        self.scene.resize_root(width, height);
        // An empty screen has nothing to redraw
        let _ = self.invalidate_all();
    }

    fn pending(&self) -> usize {
        self.regions.len() + usize::from(self.direct.is_some())
    }

    fn pop(&mut self) -> Option<Rect> {
        self.direct.take().or_else(|| self.regions.pop())
    }
}

/// State behind the touch lock
struct TouchState<T> {
    device: Option<T>,
    tracker: TouchTracker,
}

/// One rectangle of a redraw
#[derive(Debug, Clone, Copy)]
struct Job {
    rect: Rect,
    mode: UpdateMode,
    /// Logical width, maps panel lines to logical columns
    width: i32,
    border: Option<Color>,
}

/// Scanline compositing display driver
///
/// - `M`: raw mutex for the locks (`CriticalSectionRawMutex` on target)
/// - `D`: panel, `T`: touch controller, `W`: widget type of the scene
/// - `OBJS`: scene capacity, root list included
/// - `REGIONS`: dirty-region capacity
/// - `BUF_LEN`: line buffer length, at least the longer screen side
pub struct DisplayDriver<
    M: RawMutex,
    D,
    T,
    W,
    const OBJS: usize,
    const REGIONS: usize = DEFAULT_REGIONS,
    const BUF_LEN: usize = DEFAULT_BUF_LEN,
> {
    config: DisplayConfig,
    frame: Mutex<M, Frame<D, BUF_LEN>>,
    canvas: Mutex<M, Canvas<W, OBJS, REGIONS>>,
    touch: Mutex<M, TouchState<T>>,
    update: Signal<M, ()>,
    status: BlockingMutex<M, Cell<Status>>,
}

impl<M, D, T, W, const OBJS: usize, const REGIONS: usize, const BUF_LEN: usize>
    DisplayDriver<M, D, T, W, OBJS, REGIONS, BUF_LEN>
where
    M: RawMutex,
    D: DisplayDevice,
    T: TouchDevice,
    W: Widget,
{
    /// Create a driver; attach devices and call [`Self::setup`] before use
    pub fn new(config: DisplayConfig) -> Self {
        let viewport = Viewport {
            width: 0,
            height: 0,
            mode: config.update_mode,
        };
        Self {
            config,
            frame: Mutex::new(Frame {
                device: None,
                buffers: [[config.background; BUF_LEN]; 2],
                border: 0,
            }),
            canvas: Mutex::new(Canvas {
                scene: Scene::new(0, 0),
                regions: DirtyRegions::new(),
                direct: None,
                viewport,
                background: config.background,
                debug_borders: config.debug_borders,
            }),
            touch: Mutex::new(TouchState {
                device: None,
                tracker: TouchTracker::new(),
            }),
            update: Signal::new(),
            status: BlockingMutex::new(Cell::new(Status {
                state: DriverState::Uninitialized,
                width: 0,
                height: 0,
                update_mode: config.update_mode,
                rotation: config.rotation,
                inverted: config.inverted,
                calibrating: false,
                touch: None,
            })),
        }
    }

    /// Attach the panel
    pub async fn set_display_drv(&self, device: D) {
        self.frame.lock().await.device = Some(device);
    }

    /// Attach the touch controller
    pub async fn set_touch_drv(&self, touch: T) {
        self.touch.lock().await.device = Some(touch);
    }

    /// Initialize the panel and touch controller and size the scene
    ///
    /// Fails with `NullPointer` when no panel is attached and `Overflow`
    /// when a screen side does not fit in a line buffer.
    pub async fn setup(&self) -> Result<()> {
        let status = self.status();
        {
            let mut frame = self.frame.lock().await;
            let device = frame.device.as_mut().ok_or(Error::NullPointer)?;
            device.init().await?;
            device.invert_display(status.inverted).await?;
        }

        if self.config.touch {
            let mut touch = self.touch.lock().await;
            if let Some(device) = touch.device.as_mut() {
                device.init().await?;
            } else {
                warn!("touch enabled but no touch controller attached");
            }
        }

        let (width, height) = self
            .reconfigure(status.rotation, status.update_mode)
            .await?;
        if width.max(height) as usize > BUF_LEN {
            error!("screen {}x{} exceeds line buffer {}", width, height, BUF_LEN);
            return Err(Error::Overflow);
        }

        self.update_status(|s| s.state = DriverState::Ready);
        info!("display ready: {}x{}", width, height);
        Ok(())
    }

    pub fn state(&self) -> DriverState {
        self.status().state
    }

    /// Render loop; only returns if the driver was never set up
    pub async fn run(&self) -> Result<Infallible> {
        if self.state() == DriverState::Uninitialized {
            return Err(Error::CannotExecute);
        }
        self.update_status(|s| s.state = DriverState::Running);
        debug!("render loop started");

        loop {
            if let Err(e) = self.run_once().await {
                warn!("display cycle failed: {}", e);
            }
        }
    }

    /// One render loop iteration
    ///
    /// Touch is serviced even when the redraw fails.
    pub async fn run_once(&self) -> Result<()> {
        // Timing out is the normal idle path
        let _ = with_timeout(UPDATE_TIMEOUT, self.update.wait()).await;
        let rendered = self.render_pending().await;
        let touched = self.service_touch().await;
        rendered?;
        touched.map(|_| ())
    }

    /// Redraw the rectangles pending on entry
    ///
    /// Rectangles invalidated meanwhile wait for the next call. Returns the
    /// number of rectangles drawn.
    pub async fn render_pending(&self) -> Result<usize> {
        let mut frame = self.frame.lock().await;
        let Frame {
            device,
            buffers,
            border,
        } = &mut *frame;
        let device = device.as_mut().ok_or(Error::NullPointer)?;

        let pending = self.canvas.lock().await.pending();
        let mut drawn = 0;
        for _ in 0..pending {
            let job = {
                let mut canvas = self.canvas.lock().await;
                let Some(rect) = canvas.pop() else {
                    break;
                };
                let borders = cfg!(feature = "debug-borders") && canvas.debug_borders;
                Job {
                    rect,
                    mode: canvas.viewport.mode,
                    width: canvas.viewport.width,
                    border: borders.then(|| next_border(border)),
                }
            };

            if let Err(e) = self.draw_rect(device, buffers, &job).await {
                // Try the rectangle again next cycle
                let _ = self.canvas.lock().await.regions.push(job.rect);
                return Err(e);
            }
            drawn += 1;
        }
        if drawn > 0 {
            trace!("drew {} rectangles", drawn);
        }
        Ok(drawn)
    }

    async fn draw_rect(
        &self,
        device: &mut D,
        buffers: &mut [[Color; BUF_LEN]; 2],
        job: &Job,
    ) -> Result<()> {
        let rect = job.rect;
        let n = rect.width() as usize;
        if n > BUF_LEN {
            return Err(Error::Overflow);
        }
        device
            .set_addr_window(rect.x_start, rect.y_start, rect.x_end, rect.y_end)
            .await?;
        let prepare = device.is_data_need_preparation();
        let [even, odd] = buffers;

        let first = if rect.y_start % 2 == 0 {
            &mut even[..n]
        } else {
            &mut odd[..n]
        };
        self.render_line(first, rect.y_start, job).await;
        if prepare {
            device.prepare_data(first);
        }

        for line in (rect.y_start + 1)..=rect.y_end {
            let (fill, sent) = if line % 2 == 0 {
                (&mut even[..n], &odd[..n])
            } else {
                (&mut odd[..n], &even[..n])
            };
            // The buffer being filled held line - 2, whose transfer is done
            let (written, ()) =
                join(device.write_stream(sent), self.render_line(fill, line, job)).await;
            if let Err(e) = written {
                let _ = device.stop_transfer().await;
                return Err(e);
            }
            if prepare {
                device.prepare_data(fill);
            }
        }

        let last = if rect.y_end % 2 == 0 {
            &even[..n]
        } else {
            &odd[..n]
        };
        let written = device.write_stream(last).await;
        device.stop_transfer().await?;
        written
    }

    /// Compose one panel line under the line lock
    async fn render_line(&self, buf: &mut [Color], line: i32, job: &Job) {
        {
            let canvas = self.canvas.lock().await;
            buf.fill(canvas.background);
            match job.mode {
                UpdateMode::TopBottom => canvas.scene.draw_in_buf_w(buf, line, job.rect.x_start),
                UpdateMode::LeftRight => {
                    canvas
                        .scene
                        .draw_in_buf_h(buf, job.width - 1 - line, job.rect.x_start)
                }
            }
        }
        if let Some(color) = job.border {
            mark_border(buf, line, &job.rect, color);
        }
    }

    /// Sample the touch panel and dispatch the resulting gesture
    ///
    /// Returns the object that received the gesture.
    pub async fn service_touch(&self) -> Result<Option<VisHandle>> {
        if self.status().calibrating {
            return Ok(None);
        }
        let Ok(mut touch) = with_timeout(TOUCH_LOCK_TIMEOUT, self.touch.lock()).await else {
            trace!("touch lock busy, skipping sample");
            return Ok(None);
        };
        let TouchState { device, tracker } = &mut *touch;
        let Some(device) = device.as_mut() else {
            return Ok(None);
        };
        let sample = device.get_xy().await?;
        let event = tracker.track(sample);
        let position = tracker.position();
        drop(touch);

        self.update_status(|s| s.touch = position);
        match event {
            Some(event) => Ok(self.dispatch(event).await),
            None => Ok(None),
        }
    }

    async fn dispatch(&self, event: ActionEvent) -> Option<VisHandle> {
        let mut canvas = self.canvas.lock().await;
        let Canvas {
            scene,
            regions,
            viewport,
            ..
        } = &mut *canvas;
        let mut damage = Damage::new(regions, *viewport);
        let hit = scene.action(
            event.kind,
            event.x,
            event.y,
            event.prev_x,
            event.prev_y,
            &mut damage,
        );
        let dirty = damage.pushed() > 0;
        drop(canvas);

        if dirty {
            self.update.signal(());
        }
        hit
    }

    /// Schedule a logical area for redraw
    ///
    /// The area is clipped to the screen; `BadParameter` when nothing is
    /// left of it.
    pub async fn invalidate_area(
        &self,
        x_start: i32,
        y_start: i32,
        x_end: i32,
        y_end: i32,
    ) -> Result<()> {
        self.canvas
            .lock()
            .await
            .invalidate(Rect::new(x_start, y_start, x_end, y_end))?;
        self.update.signal(());
        Ok(())
    }

    /// Schedule the whole screen for redraw
    pub async fn invalidate_all(&self) -> Result<()> {
        self.canvas.lock().await.invalidate_all()?;
        self.update.signal(());
        Ok(())
    }

    /// Request an area to be drawn as one rectangle, bypassing merging
    ///
    /// Requests made before the next redraw are combined. Nothing is drawn
    /// until the update signal is raised.
    pub async fn set_update_area(
        &self,
        x_start: i32,
        y_start: i32,
        x_end: i32,
        y_end: i32,
    ) -> Result<()> {
        self.canvas
            .lock()
            .await
            .set_direct(Rect::new(x_start, y_start, x_end, y_end))
    }

    /// [`Self::set_update_area`] and raise the update signal
    pub async fn update_area(&self, x_start: i32, y_start: i32, x_end: i32, y_end: i32) -> Result<()> {
        self.set_update_area(x_start, y_start, x_end, y_end).await?;
        self.update_display();
        Ok(())
    }

    /// Redraw the screen area of one object
    pub async fn update_obj_area(&self, obj: VisHandle) -> Result<()> {
        {
            let mut canvas = self.canvas.lock().await;
            let area = canvas.scene.screen_area(obj)?;
            canvas.set_direct(area)?;
        }
        self.update_display();
        Ok(())
    }

    /// Wake the render loop
    pub fn update_display(&self) {
        self.update.signal(());
    }

    /// Switch the scan direction; the whole screen is redrawn
    pub async fn set_update_mode(&self, mode: UpdateMode) -> Result<()> {
        let status = self.status();
        if status.update_mode == mode {
            return Ok(());
        }
        self.reconfigure(status.rotation, mode).await?;
        debug!("update mode {}", mode);
        Ok(())
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.status().update_mode
    }

    /// Rotate the screen; panel and touch follow, the whole screen is
    /// redrawn
    pub async fn set_rotation(&self, rotation: Rotation) -> Result<()> {
        let mode = self.status().update_mode;
        self.reconfigure(rotation, mode).await?;
        debug!("rotation {}", rotation);
        Ok(())
    }

    pub fn rotation(&self) -> Rotation {
        self.status().rotation
    }

    /// Apply rotation and scan direction to the devices and the canvas
    ///
    /// Returns the new logical size.
    async fn reconfigure(&self, rotation: Rotation, mode: UpdateMode) -> Result<(i32, i32)> {
        let mut frame = self.frame.lock().await;
        let (width, height) = match frame.device.as_mut() {
            Some(device) => {
                device.set_rotation(panel_rotation(rotation, mode)).await?;
                logical_size(device, mode)
            }
            None => {
                let status = self.status();
                (status.width, status.height)
            }
        };
        self.canvas.lock().await.reset(width, height, mode);
        drop(frame);

        if let Some(device) = self.touch.lock().await.device.as_mut() {
            device.set_rotation(rotation);
        }

        self.update_status(|s| {
            s.rotation = rotation;
            s.update_mode = mode;
            s.width = width;
            s.height = height;
        });
        self.update.signal(());
        Ok((width, height))
    }

    /// Invert panel colors; remembered for [`Self::setup`] when no panel is
    /// attached yet
    pub async fn invert_display(&self, invert: bool) -> Result<()> {
        if let Some(device) = self.frame.lock().await.device.as_mut() {
            device.invert_display(invert).await?;
        }
        self.update_status(|s| s.inverted = invert);
        Ok(())
    }

    /// Change the color of uncovered pixels
    pub async fn set_background(&self, color: Color) {
        let mut canvas = self.canvas.lock().await;
        canvas.background = color;
        // Only fails before setup, when there is no screen yet
        let _ = canvas.invalidate_all();
        drop(canvas);
        self.update.signal(());
    }

    /// Logical screen width
    pub fn width(&self) -> i32 {
        self.status().width
    }

    /// Logical screen height
    pub fn height(&self) -> i32 {
        self.status().height
    }

    /// Run `f` on the scene under the line lock
    ///
    /// Areas `f` reports through the damage sink are scheduled for redraw,
    /// and the render loop is woken if there are any.
    pub async fn with_scene<R>(
        &self,
        f: impl FnOnce(&mut Scene<W, OBJS>, &mut Damage<'_, REGIONS>) -> R,
    ) -> R {
        let mut canvas = self.canvas.lock().await;
        let Canvas {
            scene,
            regions,
            viewport,
            ..
        } = &mut *canvas;
        let mut damage = Damage::new(regions, *viewport);
        let result = f(scene, &mut damage);
        let dirty = damage.pushed() > 0;
        drop(canvas);

        if dirty {
            self.update.signal(());
        }
        result
    }

    /// Show an object at depth `z` (0 keeps its current depth)
    pub async fn show(&self, obj: VisHandle, z: u32) -> Result<()> {
        self.with_scene(|scene, sink| scene.show(obj, z, sink)).await
    }

    pub async fn hide(&self, obj: VisHandle) -> Result<()> {
        self.with_scene(|scene, sink| scene.hide(obj, sink)).await
    }

    /// Move an object to `(x, y)`, or by `(x, y)` when `delta` is set
    pub async fn move_object(&self, obj: VisHandle, x: i32, y: i32, delta: bool) -> Result<()> {
        self.with_scene(|scene, sink| scene.move_to(obj, x, y, delta, sink))
            .await
    }

    /// Enable or disable gesture delivery to an object
    pub async fn set_active(&self, obj: VisHandle, active: bool) -> Result<()> {
        self.with_scene(|scene, _| scene.set_active(obj, active)).await
    }

    /// Panel is pressed; false without a touch controller
    pub async fn is_touched(&self) -> Result<bool> {
        match self.touch.lock().await.device.as_mut() {
            Some(device) => device.is_touched().await,
            None => Ok(false),
        }
    }

    /// Last sampled touch position while pressed
    pub fn touch_position(&self) -> Option<(i32, i32)> {
        self.status().touch
    }

    /// Uncalibrated touch reading
    pub(crate) async fn raw_touch(&self) -> Result<Option<(i32, i32)>> {
        match self.touch.lock().await.device.as_mut() {
            Some(device) => device.raw_xy().await,
            None => Err(Error::NullPointer),
        }
    }

    pub(crate) async fn install_calibration(&self, calibration: TouchCalibration) -> Result<()> {
        let mut touch = self.touch.lock().await;
        let device = touch.device.as_mut().ok_or(Error::NullPointer)?;
        device.set_calibration(calibration);
        Ok(())
    }

    /// Suspend gesture dispatch while the calibration procedure owns touch
    pub(crate) fn set_calibrating(&self, calibrating: bool) {
        self.update_status(|s| s.calibrating = calibrating);
    }

    fn status(&self) -> Status {
        self.status.lock(|cell| cell.get())
    }

    fn update_status(&self, f: impl FnOnce(&mut Status)) {
        self.status.lock(|cell| {
            let mut status = cell.get();
            f(&mut status);
            cell.set(status);
        });
    }
}

/// Panel rotation for a logical rotation
fn panel_rotation(rotation: Rotation, mode: UpdateMode) -> Rotation {
    match mode {
        UpdateMode::TopBottom => rotation,
        UpdateMode::LeftRight => rotation.next(),
    }
}

fn logical_size<D: DisplayDevice>(device: &D, mode: UpdateMode) -> (i32, i32) {
    let (width, height) = (device.width(), device.height());
    match mode {
        UpdateMode::TopBottom => (width, height),
        UpdateMode::LeftRight => (height, width),
    }
}

fn next_border(index: &mut usize) -> Color {
    *index = (*index + 1) % BORDER_COLORS.len();
    BORDER_COLORS[*index]
}

/// Outline a rectangle: its first and last line, and the ends of every line
fn mark_border(buf: &mut [Color], line: i32, rect: &Rect, color: Color) {
    if line == rect.y_start || line == rect.y_end {
        buf.fill(color);
    } else {
        if let Some(first) = buf.first_mut() {
            *first = color;
        }
        if let Some(last) = buf.last_mut() {
            *last = color;
        }
    }
}
