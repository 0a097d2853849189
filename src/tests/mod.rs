mod completion_properties;
mod properties;
