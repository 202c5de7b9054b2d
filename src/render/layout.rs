use crate::args::CrossLayoutArg;
use crate::error::Error;

/// Cubemap faces in texture array layer order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn index(self) -> usize {
        match self {
            CubeFace::PositiveX => 0,
            CubeFace::NegativeX => 1,
            CubeFace::PositiveY => 2,
            CubeFace::NegativeY => 3,
            CubeFace::PositiveZ => 4,
            CubeFace::NegativeZ => 5,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, Error> {
        match CubeFace::ALL.get(index) {
            Some(face) => Ok(*face),
            None => Err(Error::InvalidLayout {
                message: format!("face index {index} is outside 0..6"),
            }),
        }
    }
}

/// Sub-rectangle of the cross image holding one cube face, in normalized
/// bottom-left-origin coordinates. The flip flags mark cells whose content is
/// stored rotated by 180 degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceRegion {
    pub min: [f32; 2],
    pub max: [f32; 2],
    pub flip_u: bool,
    pub flip_v: bool,
}

const HORIZONTAL_COLUMN: f32 = 1.0 / 4.0;
const HORIZONTAL_ROW: f32 = 1.0 / 3.0;

// 4x3 cell grid:
//
//          +----+
//          | +Y |
//     +----+----+----+----+
//     | -X | +Z | +X | -Z |
//     +----+----+----+----+
//          | -Y |
//          +----+
const HORIZONTAL_CROSS_REGIONS: [FaceRegion; 6] = [
    FaceRegion {
        min: [2.0 * HORIZONTAL_COLUMN, HORIZONTAL_ROW],
        max: [3.0 * HORIZONTAL_COLUMN, 2.0 * HORIZONTAL_ROW],
        flip_u: false,
        flip_v: false,
    },
    FaceRegion {
        min: [0.0, HORIZONTAL_ROW],
        max: [HORIZONTAL_COLUMN, 2.0 * HORIZONTAL_ROW],
        flip_u: false,
        flip_v: false,
    },
    FaceRegion {
        min: [HORIZONTAL_COLUMN, 2.0 * HORIZONTAL_ROW],
        max: [2.0 * HORIZONTAL_COLUMN, 1.0],
        flip_u: false,
        flip_v: false,
    },
    FaceRegion {
        min: [HORIZONTAL_COLUMN, 0.0],
        max: [2.0 * HORIZONTAL_COLUMN, HORIZONTAL_ROW],
        flip_u: false,
        flip_v: false,
    },
    FaceRegion {
        min: [HORIZONTAL_COLUMN, HORIZONTAL_ROW],
        max: [2.0 * HORIZONTAL_COLUMN, 2.0 * HORIZONTAL_ROW],
        flip_u: false,
        flip_v: false,
    },
    FaceRegion {
        min: [3.0 * HORIZONTAL_COLUMN, HORIZONTAL_ROW],
        max: [1.0, 2.0 * HORIZONTAL_ROW],
        flip_u: false,
        flip_v: false,
    },
];

const VERTICAL_COLUMN: f32 = 1.0 / 3.0;
const VERTICAL_ROW: f32 = 1.0 / 4.0;

// 3x4 cell grid; the bottom -Z cell is stored rotated by 180 degrees:
//
//        +----+
//        | +Y |
//   +----+----+----+
//   | -X | +Z | +X |
//   +----+----+----+
//        | -Y |
//        +----+
//        | -Z |
//        +----+
const VERTICAL_CROSS_REGIONS: [FaceRegion; 6] = [
    FaceRegion {
        min: [2.0 * VERTICAL_COLUMN, 2.0 * VERTICAL_ROW],
        max: [1.0, 3.0 * VERTICAL_ROW],
        flip_u: false,
        flip_v: false,
    },
    FaceRegion {
        min: [0.0, 2.0 * VERTICAL_ROW],
        max: [VERTICAL_COLUMN, 3.0 * VERTICAL_ROW],
        flip_u: false,
        flip_v: false,
    },
    FaceRegion {
        min: [VERTICAL_COLUMN, 3.0 * VERTICAL_ROW],
        max: [2.0 * VERTICAL_COLUMN, 1.0],
        flip_u: false,
        flip_v: false,
    },
    FaceRegion {
        min: [VERTICAL_COLUMN, VERTICAL_ROW],
        max: [2.0 * VERTICAL_COLUMN, 2.0 * VERTICAL_ROW],
        flip_u: false,
        flip_v: false,
    },
    FaceRegion {
        min: [VERTICAL_COLUMN, 2.0 * VERTICAL_ROW],
        max: [2.0 * VERTICAL_COLUMN, 3.0 * VERTICAL_ROW],
        flip_u: false,
        flip_v: false,
    },
    FaceRegion {
        min: [VERTICAL_COLUMN, 0.0],
        max: [2.0 * VERTICAL_COLUMN, VERTICAL_ROW],
        flip_u: true,
        flip_v: true,
    },
];

/// Supported arrangements of the six cube faces within one source image.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CrossLayout {
    HorizontalCross,
    VerticalCross,
}

impl CrossLayout {
    pub const ALL: [CrossLayout; 2] = [CrossLayout::HorizontalCross, CrossLayout::VerticalCross];

    pub fn id(self) -> i32 {
        match self {
            CrossLayout::HorizontalCross => 0,
            CrossLayout::VerticalCross => 1,
        }
    }

    pub fn from_id(id: i32) -> Result<Self, Error> {
        match id {
            0 => Ok(CrossLayout::HorizontalCross),
            1 => Ok(CrossLayout::VerticalCross),
            _ => Err(Error::InvalidLayout {
                message: format!("unsupported cross layout id {id}"),
            }),
        }
    }

    /// Cell columns and rows of the cross grid.
    pub fn grid_dimensions(self) -> (u32, u32) {
        match self {
            CrossLayout::HorizontalCross => (4, 3),
            CrossLayout::VerticalCross => (3, 4),
        }
    }

    /// The source rectangle for one cube face.
    pub fn face_region(self, face: CubeFace) -> FaceRegion {
        match self {
            CrossLayout::HorizontalCross => HORIZONTAL_CROSS_REGIONS[face.index()],
            CrossLayout::VerticalCross => VERTICAL_CROSS_REGIONS[face.index()],
        }
    }

    /// Whether an image of the given size splits evenly into this layout's
    /// grid of square cells.
    pub fn matches_image_dimensions(self, width: u32, height: u32) -> bool {
        let (columns, rows) = self.grid_dimensions();
        width > 0
            && height > 0
            && width % columns == 0
            && height % rows == 0
            && width / columns == height / rows
    }
}

impl From<CrossLayoutArg> for CrossLayout {
    fn from(value: CrossLayoutArg) -> Self {
        match value {
            CrossLayoutArg::HorizontalCross => CrossLayout::HorizontalCross,
            CrossLayoutArg::VerticalCross => CrossLayout::VerticalCross,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn region_cell(layout: CrossLayout, region: &FaceRegion) -> (u32, u32) {
        let (columns, rows) = layout.grid_dimensions();
        let column = (region.min[0] * columns as f32).round() as u32;
        let row = (region.min[1] * rows as f32).round() as u32;
        (column, row)
    }

    #[test]
    fn face_indices_match_layer_order() {
        for (index, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(face.index(), index);
            assert_eq!(CubeFace::from_index(index).unwrap(), *face);
        }
    }

    #[test]
    fn face_index_out_of_range_is_rejected() {
        let error = CubeFace::from_index(6).unwrap_err();
        assert!(matches!(error, Error::InvalidLayout { .. }));
    }

    #[test]
    fn layout_ids_round_trip() {
        for layout in CrossLayout::ALL {
            assert_eq!(CrossLayout::from_id(layout.id()).unwrap(), layout);
        }
        assert!(matches!(
            CrossLayout::from_id(7),
            Err(Error::InvalidLayout { .. })
        ));
        assert!(matches!(
            CrossLayout::from_id(-1),
            Err(Error::InvalidLayout { .. })
        ));
    }

    #[test]
    fn regions_lie_inside_unit_square() {
        for layout in CrossLayout::ALL {
            for face in CubeFace::ALL {
                let region = layout.face_region(face);
                assert!(region.min[0] >= 0.0 && region.min[1] >= 0.0, "{face:?}");
                assert!(region.max[0] <= 1.0 && region.max[1] <= 1.0, "{face:?}");
                assert!(region.min[0] < region.max[0], "{face:?}");
                assert!(region.min[1] < region.max[1], "{face:?}");
            }
        }
    }

    #[test]
    fn regions_are_cells_of_equal_size() {
        for layout in CrossLayout::ALL {
            let (columns, rows) = layout.grid_dimensions();
            for face in CubeFace::ALL {
                let region = layout.face_region(face);
                let width = region.max[0] - region.min[0];
                let height = region.max[1] - region.min[1];
                assert!((width - 1.0 / columns as f32).abs() < 1e-6);
                assert!((height - 1.0 / rows as f32).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn regions_do_not_overlap() {
        for layout in CrossLayout::ALL {
            let mut cells = HashSet::new();
            for face in CubeFace::ALL {
                let region = layout.face_region(face);
                assert!(
                    cells.insert(region_cell(layout, &region)),
                    "{layout:?} maps two faces onto one cell"
                );
            }
            assert_eq!(cells.len(), 6);
        }
    }

    #[test]
    fn horizontal_regions_cover_the_cross_cells() {
        let layout = CrossLayout::HorizontalCross;
        let cells: Vec<(u32, u32)> = CubeFace::ALL
            .iter()
            .map(|face| region_cell(layout, &layout.face_region(*face)))
            .collect();
        // (column, row) with row 0 at the bottom, +X,-X,+Y,-Y,+Z,-Z order.
        assert_eq!(cells, vec![(2, 1), (0, 1), (1, 2), (1, 0), (1, 1), (3, 1)]);
    }

    #[test]
    fn vertical_regions_cover_the_cross_cells() {
        let layout = CrossLayout::VerticalCross;
        let cells: Vec<(u32, u32)> = CubeFace::ALL
            .iter()
            .map(|face| region_cell(layout, &layout.face_region(*face)))
            .collect();
        assert_eq!(cells, vec![(2, 2), (0, 2), (1, 3), (1, 1), (1, 2), (1, 0)]);
    }

    #[test]
    fn only_the_vertical_negative_z_cell_is_rotated() {
        for layout in CrossLayout::ALL {
            for face in CubeFace::ALL {
                let region = layout.face_region(face);
                let rotated =
                    layout == CrossLayout::VerticalCross && face == CubeFace::NegativeZ;
                assert_eq!(region.flip_u, rotated, "{layout:?} {face:?}");
                assert_eq!(region.flip_v, rotated, "{layout:?} {face:?}");
            }
        }
    }

    #[test]
    fn image_dimensions_must_match_the_grid() {
        assert!(CrossLayout::HorizontalCross.matches_image_dimensions(2048, 1536));
        assert!(CrossLayout::VerticalCross.matches_image_dimensions(1536, 2048));
        assert!(!CrossLayout::HorizontalCross.matches_image_dimensions(1536, 2048));
        assert!(!CrossLayout::HorizontalCross.matches_image_dimensions(2047, 1536));
        assert!(!CrossLayout::VerticalCross.matches_image_dimensions(0, 0));
    }
}
