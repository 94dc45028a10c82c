mod surface;
mod trail;

pub use surface::NannouSurface;
pub use trail::TrailRenderer;
