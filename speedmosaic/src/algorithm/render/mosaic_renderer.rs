use super::{
    color_scale::{self, Rgb, NO_DATA_COLOR, NO_DATA_LABEL, SPEED_BANDS},
    raster::{self, GridLayout, MosaicRaster, GLYPH_SIZE},
    MosaicMetadata, RenderError, RenderOptions,
};
use crate::model::mosaic::Mosaic;
use chrono::Duration;

const BACKGROUND: Rgb = [255, 255, 255];
const TEXT_COLOR: Rgb = [0, 0, 0];
const LINE_HEIGHT: u32 = GLYPH_SIZE + 4;
const SECTION_GAP: u32 = 8;
const DEFAULT_TITLE: &str = "speed mosaic";

/// draws a [Mosaic] as an annotated image: header text on top, the link × bucket
/// grid below it with links as columns in route order and the earliest bucket in
/// the first row, then a legend of the speed bands.
#[derive(Debug, Clone, Default)]
pub struct MosaicRenderer {
    options: RenderOptions,
}

impl MosaicRenderer {
    pub fn new(options: RenderOptions) -> Result<MosaicRenderer, RenderError> {
        options.validate()?;
        Ok(MosaicRenderer { options })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// renders and encodes a mosaic as png bytes.
    pub fn render(
        &self,
        mosaic: &Mosaic,
        metadata: &MosaicMetadata,
    ) -> Result<Vec<u8>, RenderError> {
        let raster = self.render_raster(mosaic, metadata)?;
        encode_png(&raster, &text_chunks(mosaic, metadata))
    }

    pub fn render_raster(
        &self,
        mosaic: &Mosaic,
        metadata: &MosaicMetadata,
    ) -> Result<MosaicRaster, RenderError> {
        let margin = self.options.margin;
        let max_dimension = self.options.max_dimension;
        let header = header_lines(mosaic, metadata);
        // labels share one fixed-width layout, so the first sets the gutter
        let gutter = raster::text_width(&row_label(mosaic, 0)) + 4;
        let legend = SPEED_BANDS
            .iter()
            .map(|b| (b.color, b.label))
            .chain(std::iter::once((NO_DATA_COLOR, NO_DATA_LABEL)))
            .collect::<Vec<_>>();

        let too_large = || RenderError::TooLarge {
            columns: mosaic.link_order().len(),
            rows: mosaic.n_buckets(),
            max_dimension,
        };
        let columns = u32::try_from(mosaic.link_order().len()).map_err(|_| too_large())?;
        let rows = u32::try_from(mosaic.n_buckets()).map_err(|_| too_large())?;
        let grid_left = margin + gutter;
        let grid_top = margin + header.len() as u32 * LINE_HEIGHT + SECTION_GAP;
        let legend_height = legend.len() as u32 * LINE_HEIGHT;
        let available_width = max_dimension.saturating_sub(grid_left + margin);
        let available_height =
            max_dimension.saturating_sub(grid_top + SECTION_GAP + legend_height + margin);
        let cell_width = self.options.cell_width.min(available_width / columns.max(1));
        let cell_height = self.options.cell_height.min(available_height / rows.max(1));
        if cell_width == 0 || cell_height == 0 {
            return Err(too_large());
        }
        if cell_width < self.options.cell_width || cell_height < self.options.cell_height {
            log::debug!("shrinking mosaic cells to {cell_width}x{cell_height} pixels");
        }
        let grid = GridLayout {
            origin_x: grid_left,
            origin_y: grid_top,
            cell_width,
            cell_height,
            columns,
            rows,
        };

        let text_extent = header
            .iter()
            .map(|l| raster::text_width(l))
            .chain(legend.iter().map(|(_, l)| raster::text_width(l) + LINE_HEIGHT))
            .max()
            .unwrap_or(0);
        let width = (grid_left + grid.width())
            .max(margin + text_extent)
            .saturating_add(margin)
            .min(max_dimension);
        let legend_top = grid_top + grid.height() + SECTION_GAP;
        let height = legend_top + legend_height + margin;

        let mut raster = MosaicRaster::new(width, height, BACKGROUND, grid);
        for (i, line) in header.iter().enumerate() {
            raster.draw_text(margin, margin + i as u32 * LINE_HEIGHT, line, TEXT_COLOR);
        }

        let label_step = (GLYPH_SIZE + 2).div_ceil(cell_height) as usize;
        for row in (0..rows).step_by(label_step) {
            let (_, y) = grid.cell_origin(0, row);
            let label = row_label(mosaic, row as usize);
            raster.draw_text(margin, y, &label, TEXT_COLOR);
        }

        for (column, link_id) in mosaic.link_order().iter().enumerate() {
            for row in 0..rows {
                let color = match mosaic.get(link_id, row as usize) {
                    Some(cell) => color_scale::color_for_speed(cell.average_speed_kph),
                    None => NO_DATA_COLOR,
                };
                let (x, y) = grid.cell_origin(column as u32, row);
                raster.fill_rect(x, y, cell_width, cell_height, color);
            }
        }

        for (i, (color, label)) in legend.iter().enumerate() {
            let y = legend_top + i as u32 * LINE_HEIGHT;
            raster.fill_rect(margin, y, GLYPH_SIZE, GLYPH_SIZE, *color);
            raster.draw_text(margin + LINE_HEIGHT, y, label, TEXT_COLOR);
        }
        Ok(raster)
    }
}

/// encodes a raster as an 8-bit RGB png with one iTXt chunk per (keyword, text) pair.
pub fn encode_png(
    raster: &MosaicRaster,
    text: &[(String, String)],
) -> Result<Vec<u8>, RenderError> {
    let mut bytes: Vec<u8> = vec![];
    {
        let mut encoder = png::Encoder::new(&mut bytes, raster.width, raster.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        for (keyword, value) in text.iter() {
            encoder.add_itxt_chunk(keyword.clone(), value.clone())?;
        }
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&raster.pixels)?;
        writer.finish()?;
    }
    Ok(bytes)
}

fn header_lines(mosaic: &Mosaic, metadata: &MosaicMetadata) -> Vec<String> {
    let title = if metadata.title.trim().is_empty() {
        DEFAULT_TITLE
    } else {
        metadata.title.trim()
    };
    let mut lines = vec![
        title.to_string(),
        format!("period: {}", mosaic.date_range()),
        format!(
            "pitch: {} min, links: {}, buckets: {}, samples: {}",
            mosaic.time_pitch_minutes(),
            mosaic.link_order().len(),
            mosaic.n_buckets(),
            mosaic.sample_count()
        ),
    ];
    if let Some(meters) = metadata.route_length_meters {
        lines.push(format!("route: {:.2} km", meters / 1000.0));
    }
    if !metadata.data_credit.trim().is_empty() {
        lines.push(format!("data: {}", metadata.data_credit.trim()));
    }
    lines
}

fn row_label(mosaic: &Mosaic, bucket: usize) -> String {
    let start = mosaic.bucket_start(bucket);
    if mosaic.date_range().duration() > Duration::days(1) {
        start.format("%m/%d %H:%M").to_string()
    } else {
        start.format("%H:%M").to_string()
    }
}

fn text_chunks(mosaic: &Mosaic, metadata: &MosaicMetadata) -> Vec<(String, String)> {
    let title = if metadata.title.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        metadata.title.clone()
    };
    let mut chunks = vec![
        (String::from("Title"), title),
        (
            String::from("Description"),
            String::from("average probe speed by link (columns) and time bucket (rows)"),
        ),
        (String::from("Period"), mosaic.date_range().to_string()),
        (
            String::from("TimePitchMinutes"),
            mosaic.time_pitch_minutes().to_string(),
        ),
        (
            String::from("LinkCount"),
            mosaic.link_order().len().to_string(),
        ),
    ];
    if !metadata.data_credit.is_empty() {
        chunks.push((String::from("Copyright"), metadata.data_credit.clone()));
    }
    chunks
}
