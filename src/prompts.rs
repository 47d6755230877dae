pub struct Prompts;

impl Prompts {
    pub const ANALYZE_CLOTHING: &'static str = "You are a fashion expert analyzing clothing items. Extract detailed information and return it in JSON format with fields: description (brief 1-2 sentence description), color (main color name), subcategory (specific type like \"t-shirt\", \"jeans\", \"sneakers\"), tags (array of descriptive tags), material (fabric type if visible), season (suitable season).";

    pub const RECOMMEND_OUTFITS: &'static str = r###"You are a professional fashion stylist. Create outfit recommendations by combining clothing items from the user's closet. Return ONLY valid JSON in this exact format:
{
  "outfits": [
    {
      "name": "Outfit Name",
      "items": ["item description 1", "item description 2", "item description 3"],
      "reasoning": "Why this outfit works for the occasion and weather"
    }
  ]
}
Generate 3-5 complete outfits. Each outfit should include items from different categories (tops, bottoms, footwear, etc.) that work well together. Only use items from the provided list."###;

    pub const STYLIST_GUIDELINES: &'static str = r###"When recommending outfits:
1. Consider the user's body type, height, and aesthetic preferences
2. Only suggest items from their available closet
3. Consider the occasion and weather they mention
4. Explain why each outfit works for them
5. Be conversational, friendly, and encouraging
6. If they don't have suitable items, suggest what types of pieces would complete the look

Keep responses concise and actionable."###;

    pub fn analyze_request(category: &str) -> String {
        format!(
            "Analyze this {} clothing item. Provide: description, color, subcategory, tags, material, and season.",
            category
        )
    }

    pub fn recommend_request(
        occasion: &str,
        weather: &str,
        profile: Option<&str>,
        clothing_json: &str,
    ) -> String {
        let preferences = profile
            .map(|p| format!("User preferences: {}\n", p))
            .unwrap_or_default();

        format!(
            "Create outfit recommendations for:\nOccasion: {}\nWeather: {}\n{}\nAvailable clothing items:\n{}\n\nReturn complete outfit combinations with reasoning.",
            occasion, weather, preferences, clothing_json
        )
    }

    pub fn stylist_system(profile: &str, clothing_json: &str) -> String {
        format!(
            "You are a professional AI fashion stylist assistant. You help users create perfect outfits from their virtual closet.\n\nUSER PROFILE:\n{}\n\nAVAILABLE CLOTHING ITEMS:\n{}\n\n{}",
            profile,
            clothing_json,
            Self::STYLIST_GUIDELINES
        )
    }
}
