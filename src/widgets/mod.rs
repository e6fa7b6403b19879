pub mod keymap;
pub mod object_information;
pub mod satellite_groups;
pub mod satellites;
pub mod world_map;
