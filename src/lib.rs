// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A nine pad drum machine. Each pad is bound to a key and a clip; triggering a pad
//! by pointer or key plays its clip and shows the pad's id on the display.

pub mod audio;
pub mod config;
pub mod controller;
pub mod display;
pub mod keyboard;
pub mod machine;
pub mod pads;
pub mod samples;
pub mod view;
