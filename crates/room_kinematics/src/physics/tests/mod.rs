//! Collision checks driven through the frame tree
