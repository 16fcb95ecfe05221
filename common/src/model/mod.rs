pub mod class_list;
pub mod mapping;
pub mod site;
pub mod template;
