mod test_concurrency;
mod test_recommendation_flow;
mod test_render_pipeline;
