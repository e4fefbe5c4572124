use autolabel_core::{Label, NormalizedBox};
use image::RgbImage;

/// Pixel buffer paired with its ordered labels.
///
/// Labels are stored as class/box pairs so a class id can never drift away
/// from the box it belongs to.
#[derive(Debug, Clone)]
pub struct LabeledImage {
    pub image: RgbImage,
    labels: Vec<Label>,
}

impl LabeledImage {
    pub fn new(image: RgbImage, labels: Vec<Label>) -> Self {
        Self { image, labels }
    }

    /// Build from parallel box and class sequences; `None` if their
    /// lengths differ.
    pub fn from_parts(
        image: RgbImage,
        boxes: Vec<NormalizedBox>,
        class_ids: Vec<u32>,
    ) -> Option<Self> {
        if boxes.len() != class_ids.len() {
            return None;
        }

        let labels = class_ids
            .into_iter()
            .zip(boxes)
            .map(|(class_id, bbox)| Label::new(class_id, bbox))
            .collect();

        Some(Self::new(image, labels))
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn boxes(&self) -> impl Iterator<Item = &NormalizedBox> + '_ {
        self.labels.iter().map(|label| &label.bbox)
    }

    pub fn class_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.labels.iter().map(|label| label.class_id)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Keep only labels accepted by `keep`, preserving order.
    pub fn retain_labels<F>(mut self, keep: F) -> Self
    where
        F: FnMut(&Label) -> bool,
    {
        self.labels.retain(keep);
        self
    }

    pub fn into_parts(self) -> (RgbImage, Vec<Label>) {
        (self.image, self.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_parallel_sequences() {
        let image = RgbImage::new(4, 4);
        let boxes = vec![NormalizedBox::new(0.5, 0.5, 0.2, 0.2)];

        assert!(LabeledImage::from_parts(image.clone(), boxes.clone(), vec![]).is_none());

        let sample = LabeledImage::from_parts(image, boxes, vec![3]).unwrap();
        assert_eq!(sample.class_ids().collect::<Vec<_>>(), vec![3]);
        assert_eq!(sample.boxes().count(), 1);
    }

    #[test]
    fn test_retain_keeps_pairs_together() {
        let labels = vec![
            Label::new(1, NormalizedBox::new(0.2, 0.2, 0.1, 0.1)),
            Label::new(2, NormalizedBox::new(0.5, 0.5, 0.0, 0.1)),
            Label::new(3, NormalizedBox::new(0.8, 0.8, 0.1, 0.1)),
        ];
        let sample = LabeledImage::new(RgbImage::new(2, 2), labels)
            .retain_labels(|label| label.bbox.width > 0.0);

        assert_eq!(sample.class_ids().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(sample.labels()[1].bbox.center_x, 0.8);
    }
}
