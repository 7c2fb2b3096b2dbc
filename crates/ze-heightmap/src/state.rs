//! Brush stroke history
//!
//! The [`HeightMapStateManager`] records every brush stroke applied to a
//! height map. Strokes are grouped into key frames; each key frame starts
//! with a snapshot of all patch heights, so any point in the history can
//! be rebuilt by restoring a snapshot and replaying at most
//! `frames_between_keys` strokes.
//!
//! ```text
//! NoStroke --start_brush_stroke--> InStroke --end_brush_stroke--> NoStroke
//!                                   |    ^
//!                                   +----+ add_point_to_stroke
//! ```

use std::collections::HashMap;

use glam::{IVec2, Vec2};

use crate::error::HeightMapError;
use crate::grid::HeightGrid;

/// Sample points of one brush stroke
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMapBrushStroke {
    pub radius: f32,
    pub feather_radius: f32,
    pub points: Vec<Vec2>,
}

/// Snapshot of all patch heights plus the strokes recorded after it
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMapKeyFrame {
    pub patches: HashMap<IVec2, Vec<f32>>,
    pub strokes: Vec<HeightMapBrushStroke>,
}

impl HeightMapKeyFrame {
    fn capture(grid: &dyn HeightGrid) -> Self {
        let patches = grid
            .patch_indices()
            .into_iter()
            .filter_map(|index| grid.patch_heights(index).map(|heights| (index, heights)))
            .collect();
        Self {
            patches,
            strokes: Vec::new(),
        }
    }

    /// Put the grid back to the snapshot
    fn restore(&self, grid: &mut dyn HeightGrid) {
        for index in grid.patch_indices() {
            if !self.patches.contains_key(&index) {
                grid.destroy_patch(index);
            }
        }
        for (&index, heights) in &self.patches {
            grid.create_patch(index, 0.0);
            grid.set_patch_heights(index, heights);
            grid.patch_modified(index);
        }
    }
}

/// Stroke history of one height map
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMapStateManager {
    frames_between_keys: usize,
    key_frames: Vec<HeightMapKeyFrame>,
    current_stroke: Option<HeightMapBrushStroke>,
}

impl Default for HeightMapStateManager {
    fn default() -> Self {
        Self::new(10)
    }
}

impl HeightMapStateManager {
    pub fn new(frames_between_keys: usize) -> Self {
        Self {
            frames_between_keys: frames_between_keys.max(1),
            key_frames: Vec::new(),
            current_stroke: None,
        }
    }

    pub fn key_frames(&self) -> &[HeightMapKeyFrame] {
        &self.key_frames
    }

    pub fn current_key_frame(&self) -> Option<&HeightMapKeyFrame> {
        self.key_frames.last()
    }

    pub fn current_stroke(&self) -> Option<&HeightMapBrushStroke> {
        self.current_stroke.as_ref()
    }

    pub fn is_in_stroke(&self) -> bool {
        self.current_stroke.is_some()
    }

    /// Begin a stroke, taking a new key frame first when none exists or
    /// the current one is full
    pub fn start_brush_stroke(
        &mut self,
        grid: &dyn HeightGrid,
        radius: f32,
        feather_radius: f32,
    ) -> Result<(), HeightMapError> {
        if self.current_stroke.is_some() {
            return Err(HeightMapError::StrokeInProgress);
        }

        let needs_key = self
            .key_frames
            .last()
            .is_none_or(|frame| frame.strokes.len() >= self.frames_between_keys);
        if needs_key {
            let frame = HeightMapKeyFrame::capture(grid);
            tracing::debug!(
                "Height map key frame {} captured ({} patches)",
                self.key_frames.len(),
                frame.patches.len()
            );
            self.key_frames.push(frame);
        }

        self.current_stroke = Some(HeightMapBrushStroke {
            radius,
            feather_radius,
            points: Vec::new(),
        });
        Ok(())
    }

    pub fn add_point_to_stroke(&mut self, point: Vec2) -> Result<(), HeightMapError> {
        let stroke = self.current_stroke.as_mut().ok_or(HeightMapError::NoStroke)?;
        stroke.points.push(point);
        Ok(())
    }

    /// Finish the stroke and file it under the current key frame
    pub fn end_brush_stroke(&mut self) -> Result<(), HeightMapError> {
        let stroke = self.current_stroke.take().ok_or(HeightMapError::NoStroke)?;
        let frame = self.key_frames.last_mut().ok_or(HeightMapError::NoKeyFrame)?;
        tracing::trace!("Brush stroke of {} points recorded", stroke.points.len());
        frame.strokes.push(stroke);
        Ok(())
    }

    /// Restore key frame `key_frame` and replay its first `stroke_count`
    /// strokes through `apply`
    pub fn rebuild<F>(
        &self,
        grid: &mut dyn HeightGrid,
        key_frame: usize,
        stroke_count: usize,
        mut apply: F,
    ) -> Result<(), HeightMapError>
    where
        F: FnMut(&mut dyn HeightGrid, &HeightMapBrushStroke),
    {
        let frame = self
            .key_frames
            .get(key_frame)
            .ok_or(HeightMapError::KeyFrameOutOfRange {
                index: key_frame,
                len: self.key_frames.len(),
            })?;
        if stroke_count > frame.strokes.len() {
            return Err(HeightMapError::StrokeOutOfRange {
                key_frame,
                requested: stroke_count,
                len: frame.strokes.len(),
            });
        }

        frame.restore(grid);
        for stroke in &frame.strokes[..stroke_count] {
            apply(&mut *grid, stroke);
        }
        tracing::debug!("Rebuilt height map from key frame {} + {} strokes", key_frame, stroke_count);
        Ok(())
    }

    /// Forget all history
    pub fn clear(&mut self) {
        self.key_frames.clear();
        self.current_stroke = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SparseHeightMap;

    fn map() -> SparseHeightMap {
        let mut map = SparseHeightMap::new(4, 4.0, 2);
        map.create_patch(IVec2::ZERO, 1.0);
        map
    }

    #[test]
    fn test_stroke_without_key_frame_is_dropped() {
        let mut state = HeightMapStateManager {
            frames_between_keys: 10,
            key_frames: Vec::new(),
            current_stroke: Some(HeightMapBrushStroke {
                radius: 1.0,
                feather_radius: 0.5,
                points: vec![Vec2::ZERO],
            }),
        };
        assert_eq!(state.end_brush_stroke(), Err(HeightMapError::NoKeyFrame));
        assert!(!state.is_in_stroke());
        assert!(state.key_frames().is_empty());
    }

    #[test]
    fn test_stroke_state_machine() {
        let map = map();
        let mut state = HeightMapStateManager::new(10);

        assert_eq!(state.add_point_to_stroke(Vec2::ZERO), Err(HeightMapError::NoStroke));
        assert_eq!(state.end_brush_stroke(), Err(HeightMapError::NoStroke));

        state.start_brush_stroke(&map, 1.0, 0.5).unwrap();
        assert_eq!(
            state.start_brush_stroke(&map, 1.0, 0.5),
            Err(HeightMapError::StrokeInProgress)
        );
        state.add_point_to_stroke(Vec2::ZERO).unwrap();
        state.add_point_to_stroke(Vec2::X).unwrap();
        state.end_brush_stroke().unwrap();

        assert!(!state.is_in_stroke());
        let frame = state.current_key_frame().unwrap();
        assert_eq!(frame.strokes.len(), 1);
        assert_eq!(frame.strokes[0].points, vec![Vec2::ZERO, Vec2::X]);
        assert_eq!(frame.strokes[0].feather_radius, 0.5);
    }

    #[test]
    fn test_key_frame_threshold() {
        let map = map();
        let mut state = HeightMapStateManager::new(2);
        for _ in 0..5 {
            state.start_brush_stroke(&map, 1.0, 1.0).unwrap();
            state.end_brush_stroke().unwrap();
        }
        let counts: Vec<usize> = state.key_frames().iter().map(|f| f.strokes.len()).collect();
        assert_eq!(counts, vec![2, 2, 1]);
    }

    #[test]
    fn test_rebuild_replays_strokes() {
        let mut map = map();
        let mut state = HeightMapStateManager::new(10);

        // Each stroke raises the cell under each of its points by one
        let raise = |grid: &mut dyn HeightGrid, stroke: &HeightMapBrushStroke| {
            for &point in &stroke.points {
                let absolute = grid.absolute_from_local(point);
                if let Some(height) = grid.absolute_height(absolute) {
                    grid.set_absolute_height(absolute, height + 1.0);
                }
            }
        };

        for _ in 0..2 {
            state.start_brush_stroke(&map, 1.0, 1.0).unwrap();
            state.add_point_to_stroke(Vec2::ZERO).unwrap();
            state.end_brush_stroke().unwrap();
            raise(&mut map, state.current_key_frame().unwrap().strokes.last().unwrap());
        }
        assert_eq!(map.absolute_height(IVec2::ZERO), Some(3.0));

        // A patch created after the snapshot disappears on rebuild
        map.create_patch(IVec2::new(1, 0), 0.0);

        state.rebuild(&mut map, 0, 1, raise).unwrap();
        assert_eq!(map.absolute_height(IVec2::ZERO), Some(2.0));
        assert!(!map.has_patch(IVec2::new(1, 0)));

        state.rebuild(&mut map, 0, 0, raise).unwrap();
        assert_eq!(map.absolute_height(IVec2::ZERO), Some(1.0));

        assert_eq!(
            state.rebuild(&mut map, 3, 0, raise),
            Err(HeightMapError::KeyFrameOutOfRange { index: 3, len: 1 })
        );
        assert!(state.rebuild(&mut map, 0, 5, raise).is_err());
    }
}
