use crate::geometry::Size;

/// Linear-step resize toward a destination size.
#[derive(Debug, Clone)]
pub struct SizeAnimation {
    current: Size,
    dest: Size,
    step: f32,
    resizing: bool,
}

impl SizeAnimation {
    pub fn new(step: f32) -> Self {
        Self {
            current: Size::zero(),
            dest: Size::zero(),
            step: step.max(0.0),
            resizing: false,
        }
    }

    pub fn current(&self) -> Size {
        self.current
    }

    pub fn dest(&self) -> Size {
        self.dest
    }

    pub fn is_resizing(&self) -> bool {
        self.resizing
    }

    pub fn set_dest(&mut self, width: f32, height: f32) {
        self.dest = Size::new(width, height);
        self.resizing = !Self::settled(self.current, self.dest);
        if !self.resizing {
            self.current = self.dest;
        }
    }

    pub fn set_immediate(&mut self, width: f32, height: f32) {
        self.dest = Size::new(width, height);
        self.current = self.dest;
        self.resizing = false;
    }

    fn settled(current: Size, dest: Size) -> bool {
        current.width as i32 == dest.width as i32 && current.height as i32 == dest.height as i32
    }

    fn step_toward(current: f32, dest: f32, step: f32) -> f32 {
        if current < dest {
            (current + step).min(dest)
        } else {
            (current - step).max(dest)
        }
    }

    pub fn update(&mut self) -> bool {
        if !self.resizing {
            return false;
        }
        if self.step <= 0.0 {
            self.current = self.dest;
        } else {
            self.current.width = Self::step_toward(self.current.width, self.dest.width, self.step);
            self.current.height =
                Self::step_toward(self.current.height, self.dest.height, self.step);
        }
        if Self::settled(self.current, self.dest) {
            self.current = self.dest;
            self.resizing = false;
        }
        self.resizing
    }
}
