//! Visualization utilities for car_planner
//!
//! Layers are collected first and drawn onto a single gnuplot axes when the
//! figure is shown or saved.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{PlannerError, PlannerResult, Pose2D};
use crate::mapping::OccupancyGrid;
use crate::path_planning::SearchTree;
use crate::vehicle::Car;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00AA00";
    pub const BLUE: &str = "#0000FF";
    pub const GRAY: &str = "#A0A0A0";
    pub const CYAN: &str = "#00AAAA";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const TREE: &str = GRAY;
    pub const START: &str = GREEN;
    pub const GOAL: &str = BLUE;
    pub const ROUTE: &str = RED;
    pub const CAR: &str = CYAN;
}

/// Style for line rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::ROUTE, "Route")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Lines {
        x: Vec<f64>,
        y: Vec<f64>,
        color: String,
        width: f64,
        caption: Option<String>,
    },
    Points {
        x: Vec<f64>,
        y: Vec<f64>,
        color: String,
        symbol: char,
        size: f64,
        caption: Option<String>,
    },
}

/// Main visualizer struct
pub struct Visualizer {
    layers: Vec<Layer>,
    title: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
}

impl Visualizer {
    /// A visualizer framed on the normalized map square
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            title: String::new(),
            x_range: Some((-1.0, 1.0)),
            y_range: Some((-1.0, 1.0)),
            aspect_ratio: Some(1.0),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Set aspect ratio (None for auto)
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> &mut Self {
        self.aspect_ratio = ratio;
        self
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Occupied cells as square markers
    pub fn plot_grid(&mut self, grid: &OccupancyGrid) -> &mut Self {
        let points = grid.occupied_points();
        if points.is_empty() {
            return self;
        }
        self.layers.push(Layer::Points {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            color: colors::OBSTACLE.to_string(),
            symbol: 'S',
            size: 0.5,
            caption: Some("Obstacles".to_string()),
        });
        self
    }

    /// One straight segment per tree edge; only the first carries the caption
    pub fn plot_tree(&mut self, tree: &SearchTree) -> &mut Self {
        for (k, (from, to)) in tree.edges().into_iter().enumerate() {
            self.layers.push(Layer::Lines {
                x: vec![from.x, to.x],
                y: vec![from.y, to.y],
                color: colors::TREE.to_string(),
                width: 1.0,
                caption: if k == 0 { Some("Tree".to_string()) } else { None },
            });
        }
        self
    }

    pub fn plot_route(&mut self, route: &[Pose2D], style: &PathStyle) -> &mut Self {
        if route.is_empty() {
            return self;
        }
        self.layers.push(Layer::Lines {
            x: route.iter().map(|p| p.x).collect(),
            y: route.iter().map(|p| p.y).collect(),
            color: style.color.clone(),
            width: style.line_width,
            caption: Some(style.caption.clone()),
        });
        self
    }

    /// A pose as a marker plus a short heading stroke
    pub fn plot_pose(&mut self, pose: &Pose2D, style: &PointStyle, heading_len: f64) -> &mut Self {
        self.layers.push(Layer::Points {
            x: vec![pose.x],
            y: vec![pose.y],
            color: style.color.clone(),
            symbol: style.symbol,
            size: style.size,
            caption: Some(style.caption.clone()),
        });
        self.layers.push(Layer::Lines {
            x: vec![pose.x, pose.x + heading_len * pose.yaw.cos()],
            y: vec![pose.y, pose.y + heading_len * pose.yaw.sin()],
            color: style.color.clone(),
            width: 2.0,
            caption: None,
        });
        self
    }

    pub fn plot_start(&mut self, pose: &Pose2D) -> &mut Self {
        self.plot_pose(pose, &PointStyle::new(colors::START, "Start").with_size(1.5), 0.08)
    }

    pub fn plot_goal(&mut self, pose: &Pose2D) -> &mut Self {
        self.plot_pose(pose, &PointStyle::new(colors::GOAL, "Goal").with_size(1.5), 0.08)
    }

    /// Body rectangle of the car at its current pose
    pub fn plot_car(&mut self, car: &Car) -> &mut Self {
        let corners = car.footprint_corners();
        let closed = corners.iter().chain(corners.first());
        let (x, y): (Vec<f64>, Vec<f64>) = closed.map(|p| (p.x, p.y)).unzip();
        self.layers.push(Layer::Lines {
            x,
            y,
            color: colors::CAR.to_string(),
            width: 2.0,
            caption: Some("Car".to_string()),
        });
        self
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();

        for layer in &self.layers {
            match layer {
                Layer::Lines {
                    x,
                    y,
                    color,
                    width,
                    caption,
                } => {
                    let mut options = vec![Color(color.as_str()), LineWidth(*width)];
                    if let Some(caption) = caption {
                        options.push(Caption(caption.as_str()));
                    }
                    axes.lines(x, y, &options);
                }
                Layer::Points {
                    x,
                    y,
                    color,
                    symbol,
                    size,
                    caption,
                } => {
                    let mut options = vec![
                        Color(color.as_str()),
                        PointSymbol(*symbol),
                        PointSize(*size),
                    ];
                    if let Some(caption) = caption {
                        options.push(Caption(caption.as_str()));
                    }
                    axes.points(x, y, &options);
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label("x", &[]);
        axes.set_y_label("y", &[]);
        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
        figure
    }

    /// Open an interactive gnuplot window
    pub fn show(&self) -> PlannerResult<()> {
        let mut figure = self.render();
        figure
            .show()
            .map(|_| ())
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }

    pub fn save_png(&self, path: &str, width: u32, height: u32) -> PlannerResult<()> {
        let mut figure = self.render();
        figure
            .save_to_png(path, width, height)
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }

    pub fn save_svg(&self, path: &str, width: u32, height: u32) -> PlannerResult<()> {
        let mut figure = self.render();
        figure
            .save_to_svg(path, width, height)
            .map_err(|e| PlannerError::VisualizationError(e.to_string()))
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
