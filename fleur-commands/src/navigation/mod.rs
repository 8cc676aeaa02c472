pub mod move_room;
