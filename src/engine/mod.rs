pub mod assets;
pub mod bounds;
pub mod logging;
pub mod mesh;
pub mod renderer;
